//! Unit tests for the archive builders.

use super::*;
use crate::env::{ProjectTree, Variables, Variant};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;
use std::io::Read;
use tempfile::TempDir;

struct Project {
    _dir: TempDir,
    root: Utf8PathBuf,
}

#[fixture]
fn project() -> Project {
    let dir = TempDir::new().expect("temp dir creation succeeds");
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
    fs::create_dir_all(root.join("sub1/sub2")).expect("mkdir");
    fs::write(root.join("geez.txt"), b"geez").expect("write file");
    fs::write(root.join("sub1/foo.txt"), b"foo").expect("write file");
    fs::write(root.join("sub1/sub2/bar.txt"), b"bar").expect("write file");
    Project { _dir: dir, root }
}

fn env_with(project: &Project, variables: &[(&str, &str)]) -> BuildEnv {
    let variables = variables
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect::<BTreeMap<_, _>>();
    BuildEnv::new(ProjectTree::new(
        project.root.clone(),
        Variables::new(variables),
        vec![Variant::new(Utf8Path::new("build"), Utf8Path::new("."))],
    ))
}

fn request(format: ArchiveFormat, sources: &[&str]) -> ArchiveRequest {
    ArchiveRequest {
        name: ArtefactName::try_from("package").expect("valid name"),
        format,
        sources: sources.iter().map(|s| (*s).to_owned()).collect(),
        naming: NamingOptions::default(),
        alias: AliasOptions::default(),
        strip_dirs: StripDirs::default(),
    }
}

fn read_members(format: ArchiveFormat, path: &Utf8Path) -> Vec<(String, String)> {
    let file = fs::File::open(path).expect("archive exists");
    let reader: Box<dyn Read> = match format {
        ArchiveFormat::Tar => Box::new(file),
        ArchiveFormat::TarGz => Box::new(flate2::read::GzDecoder::new(file)),
        ArchiveFormat::TarBz2 => Box::new(bzip2::read::BzDecoder::new(file)),
        ArchiveFormat::TarZst => Box::new(zstd::Decoder::new(file).expect("zstd stream")),
    };
    let mut archive = tar::Archive::new(reader);
    archive
        .entries()
        .expect("entries")
        .map(|entry| {
            let mut entry = entry.expect("entry");
            let name = entry.path().expect("path").to_string_lossy().into_owned();
            let mut body = String::new();
            entry.read_to_string(&mut body).expect("read body");
            (name, body)
        })
        .collect()
}

#[rstest]
#[case("tar", ArchiveFormat::Tar)]
#[case("TGZ", ArchiveFormat::TarGz)]
#[case("tar.gz", ArchiveFormat::TarGz)]
#[case("bz2", ArchiveFormat::TarBz2)]
#[case("tar.zst", ArchiveFormat::TarZst)]
fn formats_parse(#[case] raw: &str, #[case] expected: ArchiveFormat) {
    assert_eq!(raw.parse::<ArchiveFormat>(), Ok(expected));
}

#[rstest]
fn unknown_format_is_a_configuration_error() {
    assert_eq!(
        "zip".parse::<ArchiveFormat>(),
        Err(ConfigError::UnknownFormat {
            name: "zip".to_owned()
        })
    );
}

#[rstest]
#[case(ArchiveFormat::Tar, "package.tar", "package-tar")]
#[case(ArchiveFormat::TarGz, "package.tar.gz", "package-tgz")]
#[case(ArchiveFormat::TarBz2, "package.tar.bz2", "package-tbz2")]
#[case(ArchiveFormat::TarZst, "package.tar.zst", "package-tzst")]
fn default_names_follow_the_format(
    project: Project,
    #[case] format: ArchiveFormat,
    #[case] target: &str,
    #[case] alias: &str,
) {
    let env = env_with(&project, &[]);
    let resolved = request(format, &["."]).resolve(&env);
    assert_eq!(resolved.target, target);
    assert_eq!(resolved.alias.as_deref(), Some(alias));
}

#[rstest]
fn tar_suffix_variable_overrides_the_default(project: Project) {
    let env = env_with(&project, &[("TARFILESUFFIX", ".tape")]);
    let resolved = request(ArchiveFormat::Tar, &["."]).resolve(&env);
    assert_eq!(resolved.target, "package.tape");
}

#[rstest]
fn directories_expand_to_their_files(project: Project) {
    let mut env = env_with(&project, &[]);
    let built = build_archive(&mut env, &request(ArchiveFormat::Tar, &["geez.txt", "sub1"]))
        .expect("archive builds");

    assert_eq!(
        built.members,
        vec!["geez.txt", "sub1/foo.txt", "sub1/sub2/bar.txt"]
    );
    assert_eq!(
        env.aliases().targets("package-tar"),
        Some(&[Utf8PathBuf::from("package.tar")][..])
    );
}

#[rstest]
#[case(ArchiveFormat::Tar)]
#[case(ArchiveFormat::TarGz)]
#[case(ArchiveFormat::TarBz2)]
#[case(ArchiveFormat::TarZst)]
fn archives_round_trip_their_contents(project: Project, #[case] format: ArchiveFormat) {
    let mut env = env_with(&project, &[]);
    let built = build_archive(&mut env, &request(format, &["sub1"])).expect("archive builds");

    let members = read_members(format, &env.absolute(&built.artefact.target));
    assert_eq!(
        members,
        vec![
            ("sub1/foo.txt".to_owned(), "foo".to_owned()),
            ("sub1/sub2/bar.txt".to_owned(), "bar".to_owned()),
        ]
    );
}

#[rstest]
fn strip_dirs_shorten_member_names(project: Project) {
    let mut env = env_with(&project, &[]);
    let mut req = request(ArchiveFormat::TarGz, &["sub1"]);
    req.strip_dirs = StripDirs::One("sub1".to_owned());

    let built = build_archive(&mut env, &req).expect("archive builds");
    assert_eq!(built.members, vec!["foo.txt", "sub2/bar.txt"]);
}

#[rstest]
fn strip_flag_strips_the_current_directory(project: Project) {
    let mut env = env_with(&project, &[]);
    let tree = env.tree().clone().with_cwd(Utf8Path::new("sub1"));
    env = BuildEnv::new(tree);
    let mut req = request(ArchiveFormat::Tar, &["."]);
    req.strip_dirs = StripDirs::Flag(true);

    let built = build_archive(&mut env, &req).expect("archive builds");
    assert_eq!(built.artefact.target, "sub1/package.tar");
    assert_eq!(built.members, vec!["foo.txt", "sub2/bar.txt"]);
}

#[rstest]
fn the_archive_never_contains_itself(project: Project) {
    let mut env = env_with(&project, &[]);
    let req = request(ArchiveFormat::Tar, &["."]);
    build_archive(&mut env, &req).expect("first build");

    let built = build_archive(&mut env, &req).expect("second build");
    assert!(!built.members.iter().any(|m| m == "package.tar"));
    assert_eq!(built.members.len(), 3);
}

#[rstest]
#[case::dot_relative(false)]
#[case::absolute(true)]
fn explicit_targets_are_never_packed_into_themselves(project: Project, #[case] absolute: bool) {
    let mut env = env_with(&project, &[]);
    let mut req = request(ArchiveFormat::Tar, &["."]);
    let target = if absolute {
        project.root.join("out.tar")
    } else {
        Utf8PathBuf::from("./out.tar")
    };
    req.naming.target = Some(target);
    build_archive(&mut env, &req).expect("first build");

    let built = build_archive(&mut env, &req).expect("second build");
    assert!(!built.members.iter().any(|m| m.ends_with("out.tar")));
    assert_eq!(built.members.len(), 3);
    let packed = read_members(ArchiveFormat::Tar, &project.root.join("out.tar"));
    assert_eq!(packed.len(), 3);
}

#[rstest]
fn duplicate_sources_are_packed_once(project: Project) {
    let mut env = env_with(&project, &[]);
    let built = build_archive(
        &mut env,
        &request(ArchiveFormat::Tar, &["sub1/foo.txt", "sub1", "#sub1/foo.txt"]),
    )
    .expect("archive builds");
    assert_eq!(built.members, vec!["sub1/foo.txt", "sub1/sub2/bar.txt"]);
}

#[rstest]
fn versioned_archives_land_in_the_output_directory(project: Project) {
    let mut env = env_with(&project, &[]);
    let mut req = request(ArchiveFormat::TarGz, &["geez.txt"]);
    req.naming.version = Some("1.2".to_owned());
    req.naming.out_dir = Some(Utf8PathBuf::from("dist"));

    let built = build_archive(&mut env, &req).expect("archive builds");
    assert_eq!(built.artefact.target, "dist/package-1.2.tar.gz");
    assert!(project.root.join("dist/package-1.2.tar.gz").is_file());
}

#[rstest]
fn empty_source_lists_are_rejected(project: Project) {
    let mut env = env_with(&project, &[]);
    let err = build_archive(&mut env, &request(ArchiveFormat::Tar, &[])).expect_err("no sources");
    assert!(matches!(err, BuildError::EmptySources { name } if name == "package"));
}

#[rstest]
fn missing_sources_are_reported(project: Project) {
    let mut env = env_with(&project, &[]);
    let err = build_archive(&mut env, &request(ArchiveFormat::Tar, &["absent.txt"]))
        .expect_err("missing source");
    assert!(matches!(err, BuildError::MissingSource { path } if path == "absent.txt"));
}

#[rstest]
fn invalid_strip_directories_fail_before_packing(project: Project) {
    let mut env = env_with(&project, &[]);
    let mut req = request(ArchiveFormat::Tar, &["sub1"]);
    req.strip_dirs = StripDirs::One("geez.txt".to_owned());

    let err = build_archive(&mut env, &req).expect_err("file is not a directory");
    assert!(matches!(
        err,
        BuildError::Config(ConfigError::InvalidDirectory { .. })
    ));
    assert!(!project.root.join("package.tar").exists());
}

#[rstest]
fn disabled_alias_is_not_registered(project: Project) {
    let mut env = env_with(&project, &[]);
    let mut req = request(ArchiveFormat::Tar, &["geez.txt"]);
    req.alias.alias = Some(texpack_common::AliasSetting::Disabled);

    let built = build_archive(&mut env, &req).expect("archive builds");
    assert_eq!(built.artefact.alias, None);
    assert_eq!(env.aliases().iter().count(), 0);
}

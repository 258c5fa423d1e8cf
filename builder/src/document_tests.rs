//! Unit tests for the document builders.

use super::*;
use crate::env::{ProjectTree, Variables};
use crate::exec::MockCommandExecutor;
use crate::exec::test_outputs::{failure_output, success_output};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;
use tempfile::TempDir;

struct Project {
    _dir: TempDir,
    root: Utf8PathBuf,
}

#[fixture]
fn project() -> Project {
    let dir = TempDir::new().expect("temp dir creation succeeds");
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
    fs::write(root.join("paper.tex"), b"\\documentclass{article}").expect("write source");
    fs::write(root.join("refs.bib"), b"@book{}").expect("write dep");
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
        Vec::new(),
    ))
}

fn request(builder: DocBuilder) -> DocumentRequest {
    DocumentRequest {
        name: ArtefactName::try_from("paper").expect("valid name"),
        builder,
        source: None,
        deps: Vec::new(),
        flags: None,
        naming: NamingOptions::default(),
        alias: AliasOptions::default(),
    }
}

fn is_probe(args: &[String]) -> bool {
    matches!(args, [only] if only == "--version")
}

fn arg_value<'a>(args: &'a [String], prefix: &str) -> &'a str {
    args.iter()
        .find_map(|arg| arg.strip_prefix(prefix))
        .expect("argument present")
}

/// Pretend to be a TeX installation by writing the files each program
/// would produce.
fn simulate(program: &str, args: &[String], cwd: &Utf8Path) {
    match program {
        "latex" | "pdflatex" => {
            let dir = arg_value(args, "-output-directory=");
            let job = arg_value(args, "-jobname=");
            let extension = if program == "latex" { "dvi" } else { "pdf" };
            fs::write(Utf8Path::new(dir).join(format!("{job}.{extension}")), program)
                .expect("write engine output");
        }
        "dvipdfm" => {
            let position = args.iter().position(|a| a == "-o").expect("-o flag");
            let name = args.get(position + 1).expect("output name");
            fs::write(cwd.join(name), program).expect("write dvipdfm output");
        }
        other => panic!("unexpected program {other}"),
    }
}

fn tex_installation(missing: &'static [&'static str]) -> MockCommandExecutor {
    let mut executor = MockCommandExecutor::new();
    executor.expect_run().returning(move |program, args, cwd| {
        if is_probe(args) {
            return Ok(if missing.iter().any(|m| *m == program) {
                failure_output("command not found")
            } else {
                success_output(program)
            });
        }
        simulate(program, args, cwd);
        Ok(success_output("Output written"))
    });
    executor
}

#[rstest]
#[case("dvi", DocBuilder::Dvi)]
#[case("PDF", DocBuilder::Pdf)]
#[case("DviPdfm", DocBuilder::DviPdfm)]
fn builders_parse_case_insensitively(#[case] raw: &str, #[case] expected: DocBuilder) {
    assert_eq!(raw.parse::<DocBuilder>(), Ok(expected));
}

#[rstest]
fn unknown_builders_are_unsupported() {
    assert_eq!(
        "PS".parse::<DocBuilder>(),
        Err(ConfigError::UnsupportedBuilder {
            name: "PS".to_owned()
        })
    );
}

#[rstest]
fn dvi_builder_ignores_an_explicit_suffix(project: Project) {
    let env = env_with(&project, &[]);
    let mut req = request(DocBuilder::Dvi);
    req.naming.suffix = Some(".foo".to_owned());

    let resolved = req.resolve(&env);
    assert_eq!(resolved.target, "paper.dvi");
    assert_eq!(resolved.alias.as_deref(), Some("paper-dvi"));
}

#[rstest]
#[case(DocBuilder::Pdf, "PDFSUFFIX")]
#[case(DocBuilder::DviPdfm, "DVIPDFMSUFFIX")]
fn pdf_builders_honour_their_suffix_variable(
    project: Project,
    #[case] builder: DocBuilder,
    #[case] variable: &str,
) {
    let env = env_with(&project, &[(variable, ".PDF")]);
    let resolved = request(builder).resolve(&env);
    assert_eq!(resolved.target, "paper.PDF");
    assert_eq!(resolved.alias.as_deref(), Some("paper-pdf"));
}

#[rstest]
fn explicit_pdf_suffix_wins(project: Project) {
    let env = env_with(&project, &[("PDFSUFFIX", ".PDF")]);
    let mut req = request(DocBuilder::Pdf);
    req.naming.suffix = Some(".out.pdf".to_owned());
    assert_eq!(req.resolve(&env).target, "paper.out.pdf");
}

#[rstest]
#[case(DocBuilder::Dvi, "paper.dvi")]
#[case(DocBuilder::Pdf, "paper.pdf")]
#[case(DocBuilder::DviPdfm, "paper.pdf")]
fn documents_are_built_and_aliased(
    project: Project,
    #[case] builder: DocBuilder,
    #[case] target: &str,
) {
    let mut env = env_with(&project, &[]);
    let executor = tex_installation(&[]);

    let built = build_document(&mut env, &executor, &request(builder)).expect("document builds");
    assert!(built.rebuilt);
    assert_eq!(built.artefact.target, target);
    assert!(project.root.join(target).is_file());
    let alias = built.artefact.alias.expect("alias registered");
    assert_eq!(
        env.aliases().targets(&alias),
        Some(&[Utf8PathBuf::from(target)][..])
    );
}

#[rstest]
fn versioned_documents_are_renamed_into_the_output_directory(project: Project) {
    let mut env = env_with(&project, &[]);
    let executor = tex_installation(&[]);
    let mut req = request(DocBuilder::Pdf);
    req.naming.version = Some("2".to_owned());
    req.naming.out_dir = Some(Utf8PathBuf::from("out"));

    let built = build_document(&mut env, &executor, &req).expect("document builds");
    assert_eq!(built.artefact.target, "out/paper-2.pdf");
    assert!(project.root.join("out/paper-2.pdf").is_file());
}

#[rstest]
fn suffixless_targets_receive_the_engine_output(project: Project) {
    let mut env = env_with(&project, &[]);
    let executor = tex_installation(&[]);
    let mut req = request(DocBuilder::Pdf);
    req.naming.target = Some(Utf8PathBuf::from("final"));

    build_document(&mut env, &executor, &req).expect("document builds");
    assert!(project.root.join("final").is_file());
    assert!(!project.root.join("final.pdf").exists());
}

#[rstest]
fn construction_flags_precede_the_builder_flags(project: Project) {
    let mut env = env_with(&project, &[("LATEXFLAGS", "-halt-on-error -recorder")]);
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .withf(|_, args, _| is_probe(args))
        .returning(|program, _, _| Ok(success_output(program)));
    executor
        .expect_run()
        .withf(|program, args, _| {
            program == "latex"
                && args.first().map(String::as_str) == Some("-halt-on-error")
                && args.get(1).map(String::as_str) == Some("-recorder")
                && args.get(2).map(String::as_str) == Some("-interaction=nonstopmode")
        })
        .times(1)
        .returning(|program, args, cwd| {
            simulate(program, args, cwd);
            Ok(success_output(""))
        });

    build_document(&mut env, &executor, &request(DocBuilder::Dvi)).expect("document builds");
}

#[rstest]
fn document_flags_replace_the_construction_flags(project: Project) {
    let mut env = env_with(&project, &[("PDFLATEXFLAGS", "-recorder")]);
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .withf(|_, args, _| is_probe(args))
        .returning(|program, _, _| Ok(success_output(program)));
    executor
        .expect_run()
        .withf(|_, args, _| {
            args.first().map(String::as_str) == Some("-shell-escape")
                && !args.iter().any(|a| a == "-recorder")
        })
        .times(1)
        .returning(|program, args, cwd| {
            simulate(program, args, cwd);
            Ok(success_output(""))
        });
    let mut req = request(DocBuilder::Pdf);
    req.flags = Some("-shell-escape".to_owned());

    build_document(&mut env, &executor, &req).expect("document builds");
}

#[rstest]
fn up_to_date_documents_are_not_rebuilt(project: Project) {
    let mut env = env_with(&project, &[]);
    let req = DocumentRequest {
        deps: vec!["refs.bib".to_owned()],
        ..request(DocBuilder::Pdf)
    };
    build_document(&mut env, &tex_installation(&[]), &req).expect("first build");

    let mut idle = MockCommandExecutor::new();
    idle.expect_run().times(0);
    let built = build_document(&mut env, &idle, &req).expect("second build");
    assert!(!built.rebuilt);
    assert_eq!(
        env.aliases().targets("paper-pdf"),
        Some(&[Utf8PathBuf::from("paper.pdf")][..])
    );
}

#[rstest]
fn missing_dependencies_are_reported(project: Project) {
    let mut env = env_with(&project, &[]);
    let req = DocumentRequest {
        deps: vec!["figure.eps".to_owned()],
        ..request(DocBuilder::Pdf)
    };

    let err = build_document(&mut env, &tex_installation(&[]), &req).expect_err("missing dep");
    assert!(matches!(err, BuildError::MissingSource { path } if path == "figure.eps"));
}

#[rstest]
fn custom_sources_are_used(project: Project) {
    fs::write(project.root.join("main.tex"), b"").expect("write source");
    let env = env_with(&project, &[]);
    let req = DocumentRequest {
        source: Some("main.tex".to_owned()),
        ..request(DocBuilder::Pdf)
    };
    assert_eq!(req.source_path(&env).expect("resolves"), "main.tex");
}

#[rstest]
fn missing_engines_are_reported(project: Project) {
    let mut env = env_with(&project, &[]);
    let err = build_document(
        &mut env,
        &tex_installation(&["pdflatex"]),
        &request(DocBuilder::Pdf),
    )
    .expect_err("pdflatex missing");
    assert!(matches!(
        err,
        BuildError::ToolUnavailable { program, variable: "PDFLATEX" } if program == "pdflatex"
    ));
}

#[rstest]
fn missing_dvipdfm_is_reported_after_latex(project: Project) {
    let mut env = env_with(&project, &[]);
    let err = build_document(
        &mut env,
        &tex_installation(&["dvipdfm"]),
        &request(DocBuilder::DviPdfm),
    )
    .expect_err("dvipdfm missing");
    assert!(matches!(err, BuildError::ToolUnavailable { variable: "DVIPDFM", .. }));
    assert!(project.root.join("paper.dvi").is_file());
}

#[rstest]
fn engines_that_write_nothing_are_reported(project: Project) {
    let mut env = env_with(&project, &[]);
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .returning(|program, _, _| Ok(success_output(program)));

    let err = build_document(&mut env, &executor, &request(DocBuilder::Pdf))
        .expect_err("no output");
    assert!(matches!(err, BuildError::MissingOutput { program, .. } if program == "pdflatex"));
}

#[rstest]
fn failing_engines_are_reported(project: Project) {
    let mut env = env_with(&project, &[]);
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .withf(|_, args, _| is_probe(args))
        .returning(|program, _, _| Ok(success_output(program)));
    executor
        .expect_run()
        .withf(|_, args, _| !is_probe(args))
        .returning(|_, _, _| Ok(failure_output("! Undefined control sequence.")));

    let err = build_document(&mut env, &executor, &request(DocBuilder::Dvi))
        .expect_err("latex fails");
    assert!(matches!(
        err,
        BuildError::CommandFailed { program, message }
            if program == "latex" && message.contains("Undefined control sequence")
    ));
}

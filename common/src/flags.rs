//! Command-line flag concatenation.

/// Combine configured flags with extra flags required by a builder.
///
/// The base flags come from `explicit` when set, otherwise from
/// `environment`, otherwise there are none. Both are whitespace-separated
/// strings split into individual words; `extra` is appended after them.
///
/// # Examples
///
/// ```
/// use texpack_common::flags::append_flags;
///
/// let env_flags = Some("-halt-on-error -recorder");
/// let flags = append_flags(None, env_flags, &["-interaction=nonstopmode"]);
/// assert_eq!(flags, ["-halt-on-error", "-recorder", "-interaction=nonstopmode"]);
/// ```
#[must_use]
pub fn append_flags(
    explicit: Option<&str>,
    environment: Option<&str>,
    extra: &[&str],
) -> Vec<String> {
    explicit
        .or(environment)
        .unwrap_or_default()
        .split_whitespace()
        .chain(extra.iter().copied())
        .map(str::to_owned)
        .collect()
}

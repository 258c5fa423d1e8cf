//! The precedence chain shared by target and alias resolution.

/// Return the first present value, trying the tiers from most to least
/// specific.
///
/// Every optional setting in texpack follows the same ordering: an explicit
/// value wins over a specific override, which wins over the entry point's
/// default, which wins over the bare fallback.
///
/// # Examples
///
/// ```
/// use texpack_common::precedence::first_present;
///
/// assert_eq!(first_present(None, Some(".tgz"), Some(".tar.gz"), ""), ".tgz");
/// assert_eq!(first_present(None, None, Some(".tar.gz"), ""), ".tar.gz");
/// assert_eq!(first_present::<&str>(None, None, None, ""), "");
/// ```
pub fn first_present<T>(
    explicit: Option<T>,
    specific: Option<T>,
    default: Option<T>,
    fallback: T,
) -> T {
    explicit.or(specific).or(default).unwrap_or(fallback)
}

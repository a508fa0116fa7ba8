use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Resolves a path template by replacing `{key}` placeholders with
/// percent-encoded values.
///
/// Placeholders without a matching variable are left untouched so a
/// misconfigured template is visible in the request log instead of silently
/// collapsing path segments.
///
/// # Examples
/// ```
/// use sacco_util::http_path_resolution::build_path;
///
/// let path = build_path("/loan-applications/{loanId}/guarantors", &[("loanId", "42")]);
/// assert_eq!(path, "/loan-applications/42/guarantors");
/// ```
pub fn build_path(template: &str, variables: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (key, value) in variables {
        let encoded = utf8_percent_encode(value, NON_ALPHANUMERIC).to_string();
        path = path.replace(&format!("{{{}}}", key), &encoded);
    }
    path
}

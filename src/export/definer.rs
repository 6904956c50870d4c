// ABOUTME: Removes DEFINER=... clauses from dumped view definitions
// ABOUTME: Restoring a view whose definer the restoring account cannot impersonate fails

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::borrow::Cow;

// Byte-oriented so non-UTF-8 dump output passes through untouched. The clause
// never spans lines, matching `sed 's/DEFINER[ ]*=[ ]*[^*]*\*/\*/'`.
static DEFINER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)DEFINER[ ]*=[ ]*[^*\n]*\*").expect("valid definer regex"));

/// Replace every `DEFINER=<user>` clause that runs up to a `*` with just `*`.
///
/// Applying it twice gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// # use mysql_dump_curator::export::strip_definer_clauses;
/// let dumped = b"/*!50013 DEFINER=`app`@`%` SQL SECURITY DEFINER */";
/// assert_eq!(&strip_definer_clauses(dumped)[..], b"/*!50013 */");
/// ```
pub fn strip_definer_clauses(input: &[u8]) -> Cow<'_, [u8]> {
    DEFINER_RE.replace_all(input, &b"*"[..])
}

//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped in a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Route of a post page
///
/// # Examples
/// ```ignore
/// post_path("como-utilizar-hooks") // -> "/post/como-utilizar-hooks"
/// ```
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", encode_segment(uid))
}

/// Percent-encode one path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Whether a uid can be used as one directory name under the public dir
pub fn is_path_safe_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\'])
        && !uid.chars().any(char::is_control)
}

use crate::properties::FindReplacePair;

/// File rewritten by the find/replace step, relative to the extracted bundle root.
pub const TEMPLATE_FILE_NAME: &str = "index.html";
/// Grants the destination bucket owner full control of uploaded objects.
pub const BUCKET_OWNER_FULL_CONTROL: &str = "bucket-owner-full-control";

const CONTENT_TYPES: &[(&str, &str)] = &[
    (".htm", "text/html"),
    (".html", "text/html"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
];

/// Content type for a published asset, or `None` to leave the store default.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    CONTENT_TYPES
        .iter()
        .find(|(suffix, _)| file_name.ends_with(suffix))
        .map(|(_, content_type)| *content_type)
}

/// Joins the destination prefix with a `/`-separated relative path.
pub fn destination_key(prefix: &str, relative_path: &str) -> String {
    let relative_path = relative_path.trim_start_matches('/');
    if prefix.is_empty() {
        relative_path.to_string()
    } else if prefix.ends_with('/') {
        format!("{prefix}{relative_path}")
    } else {
        format!("{prefix}/{relative_path}")
    }
}

/// Applies every pair, in order, to each line before moving to the next line.
///
/// Pairs are applied sequentially, so a replacement that contains a later
/// pair's find token is rewritten again by that later pair.
pub fn apply_find_replace(text: &str, pairs: &[FindReplacePair]) -> String {
    if pairs.is_empty() {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let mut line = line.to_string();
        for pair in pairs {
            line = line.replace(&pair.find, &pair.replace);
        }
        output.push_str(&line);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(find: &str, replace: &str) -> FindReplacePair {
        FindReplacePair {
            find: find.to_string(),
            replace: replace.to_string(),
        }
    }

    #[test]
    fn content_types_follow_extension_table() {
        assert_eq!(content_type_for("index.html"), Some("text/html"));
        assert_eq!(content_type_for("legacy.htm"), Some("text/html"));
        assert_eq!(content_type_for("css/site.css"), Some("text/css"));
        assert_eq!(content_type_for("app.js"), Some("application/javascript"));
        assert_eq!(content_type_for("logo.png"), Some("image/png"));
        assert_eq!(content_type_for("photo.jpg"), Some("image/jpeg"));
        assert_eq!(content_type_for("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(content_type_for("spinner.gif"), Some("image/gif"));
        assert_eq!(content_type_for("data.json"), None);
        assert_eq!(content_type_for("LICENSE"), None);
    }

    #[test]
    fn destination_key_joins_without_duplicate_separators() {
        assert_eq!(destination_key("ui", "index.html"), "ui/index.html");
        assert_eq!(destination_key("ui/", "js/app.js"), "ui/js/app.js");
        assert_eq!(destination_key("", "index.html"), "index.html");
    }

    #[test]
    fn pairs_apply_in_order_per_line() {
        let pairs = [pair("FOO", "bar"), pair("bar", "baz")];
        assert_eq!(apply_find_replace("FOO", &pairs), "baz");

        let reversed = [pair("bar", "baz"), pair("FOO", "bar")];
        assert_eq!(apply_find_replace("FOO", &reversed), "bar");
    }

    #[test]
    fn replaces_every_occurrence_and_keeps_line_endings() {
        let pairs = [pair("API", "https://api.example")];
        let rewritten = apply_find_replace("<a href=\"API\">API</a>\nno token\n", &pairs);
        assert_eq!(
            rewritten,
            "<a href=\"https://api.example\">https://api.example</a>\nno token\n"
        );
    }

    #[test]
    fn empty_pairs_leave_text_untouched() {
        assert_eq!(apply_find_replace("a\r\nb", &[]), "a\r\nb");
    }
}

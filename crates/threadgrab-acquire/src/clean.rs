use scraper::Html;
use threadgrab_model::ThreadRecord;

/// Strip all markup from an HTML fragment, keeping its text.
///
/// Text nodes are concatenated in document order with entities decoded.
/// Whitespace and code points are left exactly as the markup had them.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}

/// Replace every post's `cooked` HTML with plain text.
///
/// Posts without a `cooked` field, or with a `null` one, are left alone.
/// Returns how many posts were rewritten.
pub fn clean_posts(record: &mut ThreadRecord) -> usize {
    let mut cleaned = 0;
    for post in record.posts_mut() {
        if let Some(cooked) = post.cooked_mut() {
            *cooked = html_to_text(cooked);
            cleaned += 1;
        }
    }
    cleaned
}

use futures::{Stream, stream};

use crate::error::WipeResult;
use crate::store::TableStore;
use crate::types::{PageToken, ScanPage, ScanRequest, TableName};

enum Cursor {
    Next(Option<PageToken>),
    Exhausted,
}

/// Returns a lazy stream over the non-empty pages of `table`.
///
/// Nothing is requested until the stream is polled. The stream ends on the first empty page or
/// on a page without a continuation token, and yields at most one error, after which it ends.
/// Every yielded page carries its `next_token`, so a consumer that stops early can build a new
/// stream from that token and resume where it left off.
pub fn scan_pages<'a, S>(
    store: &'a S,
    table: &'a TableName,
    key_attribute: &'a str,
    page_size: Option<u32>,
    start_token: Option<PageToken>,
) -> impl Stream<Item = WipeResult<ScanPage>> + 'a
where
    S: TableStore + ?Sized,
{
    stream::try_unfold(Cursor::Next(start_token), move |cursor| {
        next_page(store, table, key_attribute, page_size, cursor)
    })
}

async fn next_page<S>(
    store: &S,
    table: &TableName,
    key_attribute: &str,
    page_size: Option<u32>,
    cursor: Cursor,
) -> WipeResult<Option<(ScanPage, Cursor)>>
where
    S: TableStore + ?Sized,
{
    let start_token = match cursor {
        Cursor::Next(token) => token,
        Cursor::Exhausted => return Ok(None),
    };

    let request = ScanRequest {
        key_attribute: key_attribute.to_string(),
        limit: page_size,
        start_token,
    };
    let page = store.scan_page(table, request).await?;

    if page.records.is_empty() {
        return Ok(None);
    }

    let cursor = match &page.next_token {
        Some(token) => Cursor::Next(Some(token.clone())),
        None => Cursor::Exhausted,
    };

    Ok(Some((page, cursor)))
}

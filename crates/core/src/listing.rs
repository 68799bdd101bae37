//! Lazy bucket enumeration
//!
//! Turns the page-at-a-time [`ObjectStore::list_page`] call into a stream of
//! [`ObjectRecord`]s. Pages are fetched only when the consumer has drained
//! the previous one, and the stream cannot be restarted.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::Stream;
use futures::stream;

use crate::error::{Error, Result};
use crate::model::ObjectRecord;
use crate::traits::ObjectStore;

enum Page {
    First,
    After(String),
    Exhausted,
}

struct Cursor {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    buffered: VecDeque<ObjectRecord>,
    page: Page,
    pages_fetched: usize,
}

/// Stream every object in `bucket`
///
/// A failed page yields a single [`Error::Listing`] and ends the stream.
pub fn list_objects(
    store: Arc<dyn ObjectStore>,
    bucket: impl Into<String>,
) -> impl Stream<Item = Result<ObjectRecord>> + Send + 'static {
    let cursor = Cursor {
        store,
        bucket: bucket.into(),
        buffered: VecDeque::new(),
        page: Page::First,
        pages_fetched: 0,
    };

    stream::unfold(cursor, |mut cursor| async move {
        loop {
            if let Some(record) = cursor.buffered.pop_front() {
                return Some((Ok(record), cursor));
            }

            let token = match std::mem::replace(&mut cursor.page, Page::Exhausted) {
                Page::Exhausted => return None,
                Page::First => None,
                Page::After(token) => Some(token),
            };

            match cursor.store.list_page(&cursor.bucket, token.clone()).await {
                Ok(page) => {
                    cursor.pages_fetched += 1;
                    tracing::debug!(
                        bucket = %cursor.bucket,
                        page = cursor.pages_fetched,
                        objects = page.objects.len(),
                        "Fetched listing page"
                    );

                    if let Some(next) = page.continuation_token {
                        if token.as_deref() == Some(next.as_str()) {
                            let err = Error::General(format!(
                                "Listing returned the same continuation token twice: {next}"
                            ));
                            return Some((Err(Error::listing(&cursor.bucket, err)), cursor));
                        }
                        cursor.page = Page::After(next);
                    }
                    cursor.buffered.extend(page.objects);
                }
                Err(e) => {
                    return Some((Err(Error::listing(&cursor.bucket, e)), cursor));
                }
            }
        }
    })
}

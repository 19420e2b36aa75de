use crate::file::{FileResult, Page};

/// Initializes the contents of a freshly allocated block
///
/// Passed to [`BufferPoolManager::pin_new`]. Any closure taking a `&mut Page`
/// works as a formatter.
///
/// [`BufferPoolManager::pin_new`]: super::BufferPoolManager::pin_new
pub trait PageFormatter {
    fn format(&self, page: &mut Page) -> FileResult<()>;
}

impl<F> PageFormatter for F
where
    F: Fn(&mut Page) -> FileResult<()>,
{
    fn format(&self, page: &mut Page) -> FileResult<()> {
        self(page)
    }
}

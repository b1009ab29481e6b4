use std::rc::Rc;

use crate::error::Result;

/// The host page: where map containers live and what locale the browser
/// reports.
pub trait Page {
    fn container(&self, id: &str) -> Option<Rc<dyn Container>>;

    fn locale(&self) -> Option<String>;
}

pub trait Container {
    fn id(&self) -> String;

    fn set_size(&self, width: &str, height: &str) -> Result<()>;
}

/// A collapsible section of the page that may hold map containers.
pub trait Panel {
    /// Ids of the elements inside the panel matching `selector`.
    fn element_ids(&self, selector: &str) -> Vec<String>;
}

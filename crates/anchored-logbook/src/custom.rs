use std::error::Error as StdError;

use crate::request::WorkerRequest;


/// The literal reply with which a [`CustomLogger`] claims a request, suppressing standard
/// writing for it.
pub const BYPASS_REPLY: &str = "bypass";

/// An optional collaborator offered every request before standard logging.
///
/// The collaborator is the only consumer of type codes at or above
/// [`CUSTOM_TYPE_THRESHOLD`], but it is offered ordinary requests too. Replying with the literal
/// [`BYPASS_REPLY`] token suppresses standard writing for that one request; any other reply lets
/// standard writing proceed.
///
/// A failing collaborator never fails its facility: errors are logged and standard writing
/// proceeds unaffected.
///
/// [`CUSTOM_TYPE_THRESHOLD`]: crate::message::CUSTOM_TYPE_THRESHOLD
pub trait CustomLogger: Send {
    /// Offer one request to the collaborator. The returned string is compared against
    /// [`BYPASS_REPLY`].
    fn handle(
        &mut self,
        request: &WorkerRequest,
    ) -> Result<String, Box<dyn StdError + Send + Sync>>;

    /// Called once when the owning facility is closing, before its targets are finalized.
    fn session_closing(&mut self) {}
}

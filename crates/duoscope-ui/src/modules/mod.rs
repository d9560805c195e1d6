// crates/duoscope-ui/src/modules/mod.rs
//
// Panel registry. To add a new panel:
//   1. Create modules/mypanel.rs implementing ReviewModule
//   2. Add `pub mod mypanel;` below
//   3. Give it a field on DuoscopeApp and a panel slot in update()

pub mod inspector;
pub mod toolbar;
pub mod viewer;

use egui::Ui;

use duoscope_core::commands::ReviewCommand;
use duoscope_core::helpers::geometry::Side;
use duoscope_core::{ReviewConfig, ReviewSession};
use duoscope_media::VideoStream;

use crate::context::AppContext;

/// Everything a panel asks the app to do. Review actions go straight to the
/// core session; the rest are host chores (dialogs, workers, settings).
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Review(ReviewCommand),
    OpenVideo(Side),
    OpenMetadata(Side),
    /// Forget every loaded file and drop the review.
    CloseMedia,
    UpdateConfig(ReviewConfig),
}

impl From<ReviewCommand> for AppCommand {
    fn from(cmd: ReviewCommand) -> Self { AppCommand::Review(cmd) }
}

/// Read-only view of the app handed to panels each frame.
pub struct ReviewView<'a> {
    pub session: &'a ReviewSession<VideoStream>,
    pub context: &'a AppContext,
}

/// Every panel implements this trait.
/// Panels read the view and emit commands; they never mutate the session.
pub trait ReviewModule {
    fn name(&self) -> &str;
    fn ui(&mut self, ui: &mut Ui, view: &ReviewView<'_>, cmd: &mut Vec<AppCommand>);
}

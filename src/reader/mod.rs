//! Reading position and the surfaces that display it.
//!
//! [`cursor::ScrollCursor`] owns the canonical position. The narrow surface
//! mirrors it directly; the wide panel reports back through
//! [`reconcile::Reconciler`]. [`session::Reader`] ties both to the library
//! and the persistence coordinator.

pub mod cursor;
pub mod reconcile;
pub mod session;
pub mod surface;

pub use cursor::{ScrollCursor, VisibleWindow};
pub use reconcile::{Commit, Reconciler};
pub use session::{Host, Reader};
pub use surface::{
    HostPrompts, NarrowSurface, Notice, NoticeLevel, PanelMessage, ReplaceDecision, ScrollReport,
    StatusLine, SurfaceError, WideSurface,
};

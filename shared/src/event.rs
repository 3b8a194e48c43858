use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::model::{Branch, CarField, CarRecord, ImageFile, SessionContext};

/// Identifies one lifetime of the open view. Every continuation carries the
/// generation it was issued under so late responses can be discarded.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

pub type CarResponse = crux_http::Result<crux_http::Response<CarRecord>>;
pub type BranchesResponse = crux_http::Result<crux_http::Response<Vec<Branch>>>;
pub type UpdateResponse = crux_http::Result<crux_http::Response<Vec<u8>>>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Shell lifecycle
    Configure(EditorConfig),
    Open {
        car_id: String,
        session: SessionContext,
    },
    SessionChanged(SessionContext),
    Close,

    // User input
    UpdateField {
        field: CarField,
        value: String,
    },
    SelectImage(ImageFile),
    ClearImage,
    Submit,
    DismissError,

    // Capability responses (boxed to keep enum size small)
    #[serde(skip)]
    CarLoaded {
        generation: Generation,
        result: Box<CarResponse>,
    },
    #[serde(skip)]
    BranchesLoaded {
        generation: Generation,
        result: Box<BranchesResponse>,
    },
    #[serde(skip)]
    SubmitCompleted {
        generation: Generation,
        result: Box<UpdateResponse>,
    },
    #[serde(skip)]
    RedirectDue { generation: Generation },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::Open { .. } => "open",
            Self::SessionChanged(_) => "session_changed",
            Self::Close => "close",
            Self::UpdateField { .. } => "update_field",
            Self::SelectImage(_) => "select_image",
            Self::ClearImage => "clear_image",
            Self::Submit => "submit",
            Self::DismissError => "dismiss_error",
            Self::CarLoaded { .. } => "car_loaded",
            Self::BranchesLoaded { .. } => "branches_loaded",
            Self::SubmitCompleted { .. } => "submit_completed",
            Self::RedirectDue { .. } => "redirect_due",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::UpdateField { .. }
                | Self::SelectImage(_)
                | Self::ClearImage
                | Self::Submit
                | Self::DismissError
        )
    }

    /// Generation of a continuation event, `None` for events raised by the shell.
    #[must_use]
    pub const fn generation(&self) -> Option<Generation> {
        match self {
            Self::CarLoaded { generation, .. }
            | Self::BranchesLoaded { generation, .. }
            | Self::SubmitCompleted { generation, .. }
            | Self::RedirectDue { generation } => Some(*generation),
            _ => None,
        }
    }
}

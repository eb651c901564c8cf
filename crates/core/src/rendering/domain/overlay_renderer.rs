use std::fmt;

use crate::pipeline::frame_result::FrameResult;
use crate::shared::frame::Frame;

/// One of the annotated images produced for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Full frame with skeletons, boxes and metric cards.
    Main,
    /// Side-view crop around the primary person.
    Sagittal,
    /// Front-view crop around the primary person.
    Coronal,
    /// Simulated load heatmap over the primary person.
    Heatmap,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Main,
        ViewKind::Sagittal,
        ViewKind::Coronal,
        ViewKind::Heatmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Main => "main",
            ViewKind::Sagittal => "sagittal",
            ViewKind::Coronal => "coronal",
            ViewKind::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draws analysis results onto a frame.
///
/// Purely presentational: the input frame is left untouched and annotated
/// copies are returned.
pub trait OverlayRenderer: Send {
    fn render(&self, frame: &Frame, result: &FrameResult) -> Frame;

    /// Every view this renderer can produce, main view first.
    fn render_views(&self, frame: &Frame, result: &FrameResult) -> Vec<(ViewKind, Frame)> {
        vec![(ViewKind::Main, self.render(frame, result))]
    }
}

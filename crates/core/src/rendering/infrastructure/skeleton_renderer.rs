use crate::pipeline::frame_result::{FrameResult, PersonResult};
use crate::pose::domain::landmark::{Landmark, LandmarkName as L, LandmarkSet};
use crate::rendering::domain::overlay_renderer::{OverlayRenderer, ViewKind};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::canvas::{Canvas, Rgb, GLYPH_HEIGHT};
use super::stress_map::render_stress_map;

const RIGHT: Rgb = [255, 165, 0];
const LEFT: Rgb = [0, 255, 0];
const FACE: Rgb = [0, 255, 255];
const SPINE: Rgb = [0, 200, 255];
const WHITE: Rgb = [255, 255, 255];
const RED: Rgb = [255, 0, 0];
const YELLOW: Rgb = [255, 255, 0];
const SAGITTAL_TINT: Rgb = [0, 100, 255];
const CORONAL_TINT: Rgb = [100, 255, 0];

const TEXT_SCALE: i64 = 2;
const LINE_HEIGHT: i64 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
/// Distance from the box's left edge to the metric card.
const HUD_OFFSET: i64 = 90;
const VIEW_PAD: u32 = 20;
const VIEW_TINT_ALPHA: f64 = 0.2;
const LABEL_ORIGIN: (i64, i64) = (10, 10);
/// Side of the blank view returned when a crop is empty.
const EMPTY_VIEW_SIZE: u32 = 200;

/// Limb segments with their side color.
const CONNECTIONS: &[(L, L, Rgb)] = &[
    (L::RightShoulder, L::RightElbow, RIGHT),
    (L::RightElbow, L::RightWrist, RIGHT),
    (L::LeftShoulder, L::LeftElbow, LEFT),
    (L::LeftElbow, L::LeftWrist, LEFT),
    (L::RightHip, L::RightKnee, RIGHT),
    (L::RightKnee, L::RightAnkle, RIGHT),
    (L::LeftHip, L::LeftKnee, LEFT),
    (L::LeftKnee, L::LeftAnkle, LEFT),
    (L::Nose, L::LeftEye, FACE),
    (L::Nose, L::RightEye, FACE),
    (L::LeftEye, L::LeftEar, FACE),
    (L::RightEye, L::RightEar, FACE),
    (L::LeftShoulder, L::RightShoulder, FACE),
    (L::LeftHip, L::RightHip, FACE),
    (L::LeftShoulder, L::LeftHip, LEFT),
    (L::RightShoulder, L::RightHip, RIGHT),
];

/// Landmarks drawn as joint dots.
const JOINTS: &[L] = &[
    L::Nose,
    L::LeftEye,
    L::RightEye,
    L::LeftEar,
    L::RightEar,
    L::LeftShoulder,
    L::RightShoulder,
    L::LeftElbow,
    L::RightElbow,
    L::LeftWrist,
    L::RightWrist,
    L::LeftHip,
    L::RightHip,
    L::LeftKnee,
    L::RightKnee,
    L::LeftAnkle,
    L::RightAnkle,
];

/// Draws each person's skeleton, virtual spine and bounding box, plus an
/// optional metric card (ID, Cobb, flexion, score) left of the box.
///
/// The box and score colors reflect the health score: green above 80,
/// yellow above 50, red otherwise (white when no score is available).
pub struct SkeletonRenderer {
    line_thickness: i64,
    min_visibility: f64,
    hud: bool,
}

impl SkeletonRenderer {
    pub fn new(line_thickness: u32, min_visibility: f64, hud: bool) -> Self {
        Self {
            line_thickness: line_thickness.max(1) as i64,
            min_visibility,
            hud,
        }
    }

    fn draw_hud(&self, canvas: &mut Canvas, person: &PersonResult) {
        let Some(m) = &person.metrics else {
            return;
        };
        let x = (person.bbox.x1 as i64 - HUD_OFFSET).max(0) + 4;
        let y = person.bbox.y1 as i64 + 4;
        let lines = [
            (format!("ID: {}", person.person_id), WHITE),
            (hud_value("COBB", m.cobb_angle_thoracic, 1), WHITE),
            (hud_value("FLEX", m.lumbar_flexion, 1), WHITE),
            (hud_value("SCORE", m.health_score, 0), score_color(m.health_score)),
        ];
        for (i, (text, color)) in lines.iter().enumerate() {
            canvas.text(x, y + i as i64 * LINE_HEIGHT, text, TEXT_SCALE, *color);
        }
    }

    fn draw_person(&self, canvas: &mut Canvas, person: &PersonResult, w: f64, h: f64) {
        let lm = &person.landmarks;
        let px = |p: &Landmark| ((p.x * w) as i64, (p.y * h) as i64);
        let visible = |name: L| lm.get(name).filter(|p| p.is_visible(self.min_visibility));

        for &(a, b, color) in CONNECTIONS {
            if let (Some(pa), Some(pb)) = (visible(a), visible(b)) {
                canvas.line(px(pa), px(pb), self.line_thickness, color);
            }
        }

        if let Some((shoulder, hip)) = spine_endpoints(lm) {
            let s = ((shoulder.0 * w) as i64, (shoulder.1 * h) as i64);
            let hp = ((hip.0 * w) as i64, (hip.1 * h) as i64);
            canvas.line(s, hp, self.line_thickness, SPINE);
            if let Some(nose) = visible(L::Nose) {
                canvas.line(px(nose), s, self.line_thickness, FACE);
            }
        }

        for &name in JOINTS {
            if let Some(p) = visible(name) {
                let (x, y) = px(p);
                canvas.ring(x, y, 5, 2, WHITE);
                canvas.fill_circle(x, y, 3, RED);
            }
        }

        let b = &person.bbox;
        let color = score_color(person.metrics.as_ref().and_then(|m| m.health_score));
        canvas.rect(
            b.x1 as i64,
            b.y1 as i64,
            b.x2 as i64,
            b.y2 as i64,
            self.line_thickness,
            color,
        );

        if self.hud {
            self.draw_hud(canvas, person);
        }
    }
}

impl Default for SkeletonRenderer {
    fn default() -> Self {
        Self::new(2, 0.0, true)
    }
}

impl OverlayRenderer for SkeletonRenderer {
    fn render(&self, frame: &Frame, result: &FrameResult) -> Frame {
        let mut out = frame.clone();
        let (w, h) = (frame.width() as f64, frame.height() as f64);
        let mut canvas = Canvas::new(&mut out);
        for person in &result.persons {
            self.draw_person(&mut canvas, person, w, h);
        }
        out
    }

    /// Main view plus sagittal, coronal and heatmap views of the primary
    /// person. Without persons the main view is an unannotated copy and the
    /// other views are black frames of the same size.
    fn render_views(&self, frame: &Frame, result: &FrameResult) -> Vec<(ViewKind, Frame)> {
        let Some(primary) = result.primary() else {
            return vec![
                (ViewKind::Main, frame.clone()),
                (ViewKind::Sagittal, blank_like(frame, frame.width(), frame.height())),
                (ViewKind::Coronal, blank_like(frame, frame.width(), frame.height())),
                (ViewKind::Heatmap, blank_like(frame, frame.width(), frame.height())),
            ];
        };

        let main = self.render(frame, result);
        let sagittal = tinted_crop(&main, &primary.bbox, SAGITTAL_TINT, "SAGITTAL");
        let coronal = tinted_crop(&main, &primary.bbox, CORONAL_TINT, "CORONAL");
        let mut heatmap = render_stress_map(frame, &primary.bbox);
        Canvas::new(&mut heatmap).text(
            LABEL_ORIGIN.0,
            LABEL_ORIGIN.1,
            "STRESS MAP",
            TEXT_SCALE,
            WHITE,
        );

        vec![
            (ViewKind::Main, main),
            (ViewKind::Sagittal, sagittal),
            (ViewKind::Coronal, coronal),
            (ViewKind::Heatmap, heatmap),
        ]
    }
}

fn blank_like(frame: &Frame, width: u32, height: u32) -> Frame {
    let len = width as usize * height as usize * frame.channels() as usize;
    Frame::new(vec![0u8; len], width, height, frame.channels(), frame.index())
        .with_channel_order(frame.channel_order())
        .with_timestamp_ms(frame.timestamp_ms())
}

/// Padded crop around `bbox`, tinted and labelled.
fn tinted_crop(frame: &Frame, bbox: &BoundingBox, tint: Rgb, label: &str) -> Frame {
    let window = bbox.padded_window(VIEW_PAD, frame.width(), frame.height());
    if window.is_empty() {
        return blank_like(frame, EMPTY_VIEW_SIZE, EMPTY_VIEW_SIZE);
    }
    let mut crop = frame.crop(window.x, window.y, window.width, window.height);
    let mut canvas = Canvas::new(&mut crop);
    canvas.tint(tint, VIEW_TINT_ALPHA);
    canvas.text(LABEL_ORIGIN.0, LABEL_ORIGIN.1, label, TEXT_SCALE, WHITE);
    crop
}

fn hud_value(label: &str, value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{label}: {v:.decimals$}"),
        None => format!("{label}: N/A"),
    }
}

/// Mid-shoulder and mid-hip in normalized coordinates.
fn spine_endpoints(lm: &LandmarkSet) -> Option<((f64, f64), (f64, f64))> {
    let mid = |a: L, b: L| {
        let (pa, pb) = (lm.get(a)?, lm.get(b)?);
        Some(((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0))
    };
    Some((
        mid(L::LeftShoulder, L::RightShoulder)?,
        mid(L::LeftHip, L::RightHip)?,
    ))
}

fn score_color(score: Option<f64>) -> Rgb {
    match score {
        Some(s) if s > 80.0 => LEFT,
        Some(s) if s > 50.0 => YELLOW,
        Some(_) => RED,
        None => WHITE,
    }
}

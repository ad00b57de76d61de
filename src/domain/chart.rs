use serde::Serialize;

use super::quota::{floor_percent, round_percent};
use super::{ColorTier, QuotaInfo, QuotaKind, QuotaState};

/// Delay before a freshly inserted preview segment starts growing
pub const PREVIEW_ANIMATION_DELAY_MS: u32 = 500;

/// Role of a bar segment inside a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentRole {
    /// Committed usage (or what remains of it in a decrease preview)
    Base,
    /// Projected delta of a pending action
    Delta,
    /// Leftover delta of a previous preview shrinking away
    Collapsing,
}

/// One horizontal slice of a quota bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSegment {
    pub role: SegmentRole,
    pub tier: ColorTier,
    /// Target width in percent of the bar
    pub width: u32,
    /// Width the segment animates from
    pub from_width: u32,
    /// Squared right edge so the following segment joins seamlessly
    pub flush_left: bool,
    pub translucent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl BarSegment {
    fn new(role: SegmentRole, tier: ColorTier, width: u32) -> Self {
        Self {
            role,
            tier,
            width,
            from_width: 0,
            flush_left: false,
            translucent: role != SegmentRole::Base,
            label: None,
        }
    }

    fn from_width(mut self, from: u32) -> Self {
        self.from_width = from;
        self
    }

    fn flush_left(mut self) -> Self {
        self.flush_left = true;
        self
    }

    fn with_label(mut self, percent: u32) -> Self {
        self.label = Some(format!("{}%", percent));
        self
    }

    /// Labels on narrow segments are drawn dark
    pub fn dark_label(&self) -> bool {
        self.width < 10
    }
}

/// Renderable view of a quota chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub kind: QuotaKind,
    pub unit: &'static str,
    /// Reported percent (uncapped; above 100 when over quota)
    pub percent: u32,
    pub segments: Vec<BarSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animate_after_ms: Option<u32>,
    pub info: QuotaInfo,
}

/// Output of a chart render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RenderedChart {
    Ready(ChartView),
    Unavailable { kind: QuotaKind, message: String },
}

impl RenderedChart {
    pub fn kind(&self) -> QuotaKind {
        match self {
            Self::Ready(view) => view.kind,
            Self::Unavailable { kind, .. } => *kind,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn view(&self) -> Option<&ChartView> {
        match self {
            Self::Ready(view) => Some(view),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Quota usage chart for one dimension.
///
/// Holds the committed `used`/`total` from the last successful render and
/// the segments currently on screen so that previews can animate from them.
/// Previews never touch the committed state.
#[derive(Debug, Clone)]
pub struct QuotaChart {
    kind: QuotaKind,
    state: Option<QuotaState>,
    current: RenderedChart,
}

impl QuotaChart {
    pub fn new(kind: QuotaKind) -> Self {
        Self {
            kind,
            state: None,
            current: RenderedChart::Unavailable {
                kind,
                message: format!("No {} usage loaded yet.", kind),
            },
        }
    }

    pub fn kind(&self) -> QuotaKind {
        self.kind
    }

    pub fn state(&self) -> Option<&QuotaState> {
        self.state.as_ref()
    }

    /// What is currently on screen
    pub fn current(&self) -> &RenderedChart {
        &self.current
    }

    /// Draw committed usage, replacing the stored state
    pub fn render(&mut self, used: f64, total: f64) -> RenderedChart {
        let Some(state) = QuotaState::new(self.kind, used, total) else {
            return self.render_unavailable(format!("Could not calculate {} usage.", self.kind));
        };

        let percent = state.percent();
        let css_percent = state.css_percent();
        let tier = state.tier();

        let base = BarSegment::new(SegmentRole::Base, tier, css_percent)
            .from_width(self.segment_width(SegmentRole::Base))
            .with_label(percent);
        let mut segments = vec![base];

        // A preview left on screen shrinks away instead of vanishing
        if let Some(previous) = self.segment(SegmentRole::Delta) {
            segments.push(
                BarSegment::new(SegmentRole::Collapsing, ColorTier::from_percent(css_percent), 0)
                    .from_width(previous.width),
            );
        }

        self.state = Some(state);
        self.show(ChartView {
            kind: self.kind,
            unit: self.kind.unit(),
            percent,
            segments,
            animate_after_ms: None,
            info: QuotaInfo::describe(self.kind, state.used, state.total, false, true),
        })
    }

    /// Replace the bar with the "Unavailable" placeholder.
    ///
    /// The committed state is dropped so that previews cannot run against
    /// numbers that are no longer on screen.
    pub fn render_unavailable(&mut self, message: impl Into<String>) -> RenderedChart {
        self.state = None;
        self.current = RenderedChart::Unavailable {
            kind: self.kind,
            message: message.into(),
        };
        self.current.clone()
    }

    /// Preview added usage. Returns whether the result stays within quota.
    ///
    /// The delta segment rounds while the committed part floors, so the two
    /// segments may not add up to the reported total exactly.
    pub fn add_usage(&mut self, delta: f64) -> bool {
        let Some(state) = self.state else {
            return false;
        };
        let delta = delta.max(0.0);

        let new_usage = round_percent(delta, state.total);
        let current_usage = floor_percent(state.used, state.total);
        let total_usage = floor_percent(state.used + delta, state.total);
        let under_quota = total_usage <= 100;
        let tier = ColorTier::from_percent(total_usage);

        let (segments, animate_after_ms) = if current_usage > 0 && current_usage < 100 {
            let delta_width = if total_usage > 100 {
                100 - current_usage
            } else {
                new_usage
            };

            let fresh = self.segment(SegmentRole::Delta).is_none();
            let (base_from, delta_from) = if fresh {
                (0, 0)
            } else {
                (
                    self.segment_width(SegmentRole::Base),
                    self.segment_width(SegmentRole::Delta),
                )
            };

            let base = BarSegment::new(SegmentRole::Base, tier, current_usage)
                .from_width(base_from)
                .flush_left()
                .with_label(total_usage);
            let added = BarSegment::new(SegmentRole::Delta, tier, delta_width).from_width(delta_from);

            (vec![base, added], fresh.then_some(PREVIEW_ANIMATION_DELAY_MS))
        } else {
            // Nothing committed yet, or already at/over quota: one translucent bar
            let width = if total_usage > 100 {
                100
            } else if current_usage == 0 {
                new_usage
            } else {
                total_usage
            };
            let bar = BarSegment::new(SegmentRole::Delta, tier, width).with_label(total_usage);
            (vec![bar], None)
        };

        self.show(ChartView {
            kind: self.kind,
            unit: self.kind.unit(),
            percent: total_usage,
            segments,
            animate_after_ms,
            info: QuotaInfo::describe(self.kind, state.used + delta, state.total, true, under_quota),
        });

        under_quota
    }

    /// Preview released usage (e.g. resizing down). Always within quota.
    pub fn sub_usage(&mut self, delta: f64) -> bool {
        let Some(state) = self.state else {
            return true;
        };
        let delta = delta.max(0.0);

        // Widths stay within the drawn bar; only the reported percent may exceed 100
        let current = floor_percent(state.used, state.total).min(100);
        let remaining = floor_percent(state.used, state.total)
            .saturating_sub(floor_percent(delta, state.total))
            .min(100);
        let removed = floor_percent(delta, state.total).min(current - remaining);
        let projected_used = (state.used - delta).max(0.0);
        let total_usage = floor_percent(projected_used, state.total);
        let tier = ColorTier::from_percent(total_usage);

        let base_from = self.segment_width(SegmentRole::Base);
        let mut base = BarSegment::new(SegmentRole::Base, tier, remaining).from_width(base_from);

        let segments = if delta > 0.0 {
            let mut released = BarSegment::new(SegmentRole::Delta, tier, removed)
                .from_width(self.segment_width(SegmentRole::Delta));

            // Nothing left of the base bar to carry the label
            if remaining == 0 {
                released = released.with_label(total_usage);
            } else {
                base = base.with_label(total_usage);
            }
            vec![base.flush_left(), released]
        } else {
            vec![base.with_label(total_usage)]
        };

        self.show(ChartView {
            kind: self.kind,
            unit: self.kind.unit(),
            percent: total_usage,
            segments,
            animate_after_ms: None,
            info: QuotaInfo::describe(self.kind, projected_used, state.total, true, true),
        });

        true
    }

    fn show(&mut self, view: ChartView) -> RenderedChart {
        self.current = RenderedChart::Ready(view);
        self.current.clone()
    }

    fn segment(&self, role: SegmentRole) -> Option<&BarSegment> {
        self.current
            .view()
            .and_then(|view| view.segments.iter().find(|s| s.role == role))
    }

    fn segment_width(&self, role: SegmentRole) -> u32 {
        self.segment(role).map(|s| s.width).unwrap_or(0)
    }
}

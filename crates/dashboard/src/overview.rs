//! # Overview
//!
//! The landing page's metric cards. The figures are static.

/// Bars in each card's sparkline.
pub const BAR_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: &'static str,
    /// Peak of the sparkline, 0 to 100.
    pub percent: u32,
    pub badge: &'static str,
}

impl MetricCard {
    /// Heights of the sparkline bars: a half sine wave scaled by `percent`,
    /// never lower than 8.
    pub fn bar_heights(&self) -> [u32; BAR_COUNT] {
        let mut heights = [0; BAR_COUNT];
        for (i, height) in heights.iter_mut().enumerate() {
            let wave = (i as f64 / BAR_COUNT as f64 * std::f64::consts::PI).sin();
            let scaled = (wave * f64::from(self.percent) / 1.2).round() as u32;
            *height = scaled.max(8);
        }
        heights
    }
}

pub fn metrics() -> [MetricCard; 3] {
    [
        MetricCard {
            title: "Weekly Views",
            value: "12,342",
            percent: 76,
            badge: "View report",
        },
        MetricCard {
            title: "Conversion",
            value: "3.1%",
            percent: 31,
            badge: "Improve",
        },
        MetricCard {
            title: "New Users",
            value: "+241",
            percent: 54,
            badge: "Invite",
        },
    ]
}

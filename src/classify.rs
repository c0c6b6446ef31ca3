use std::fmt;

use serde::{Deserialize, Serialize};

use crate::probe::Metric;

/// Presentation hint attached to a band or a grade. The renderer decides what
/// it looks like, the classifier only picks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Plain,
    Teal,
    Green,
    Yellow,
    Red,
    Crimson,
    Maroon,
    Gray,
}

/// Classification of a single timing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Good,
    Warning,
    Danger,
    Neutral,
}

impl Band {
    pub fn tone(self) -> Tone {
        match self {
            Band::Good => Tone::Green,
            Band::Warning => Tone::Yellow,
            Band::Danger => Tone::Red,
            Band::Neutral => Tone::Plain,
        }
    }
}

/// Ceilings for one metric, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub success: f64,
    pub warning: f64,
    pub danger: f64,
}

impl Thresholds {
    pub const CONNECT: Thresholds = Thresholds {
        success: 0.18,
        warning: 0.55,
        danger: 0.70,
    };

    pub const FIRST_BYTE: Thresholds = Thresholds {
        success: 0.40,
        warning: 0.99,
        danger: 1.28,
    };

    pub const TOTAL: Thresholds = Thresholds {
        success: 0.55,
        warning: 1.15,
        danger: 1.45,
    };

    pub fn band(&self, value: f64) -> Band {
        // 0.0 is what a failed probe reports, never colorize it
        if value == 0.0 {
            return Band::Neutral;
        }

        if value > self.danger {
            Band::Danger
        } else if value > self.warning {
            Band::Warning
        } else if value < self.success {
            Band::Good
        } else {
            Band::Neutral
        }
    }
}

/// Letter grade for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    E,
    F,
    #[serde(rename = "~")]
    OffScale,
}

impl Grade {
    pub fn tone(self) -> Tone {
        match self {
            Grade::APlus => Tone::Teal,
            Grade::A => Tone::Green,
            Grade::B => Tone::Yellow,
            Grade::C => Tone::Red,
            Grade::D => Tone::Crimson,
            Grade::E => Tone::Maroon,
            Grade::F | Grade::OffScale => Tone::Gray,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
            Grade::OffScale => "~",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ascending average total time ceilings for A+ down to E.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeScale {
    pub perfect: f64,
    pub excellent: f64,
    pub good: f64,
    pub bad: f64,
    pub awful: f64,
    pub worst: f64,
}

impl GradeScale {
    pub const DEFAULT: GradeScale = GradeScale {
        perfect: 0.510,
        excellent: 0.850,
        good: 1.150,
        bad: 1.550,
        awful: 1.950,
        worst: 2.500,
    };

    /// More failed probes than this and the run is graded F.
    pub const MAX_FAILURES: usize = 4;

    pub fn grade(&self, average_total_time: f64, failures: usize) -> Grade {
        if failures > Self::MAX_FAILURES || average_total_time <= 0.0 {
            return Grade::F;
        }

        let bands = [
            (self.perfect, Grade::APlus),
            (self.excellent, Grade::A),
            (self.good, Grade::B),
            (self.bad, Grade::C),
            (self.awful, Grade::D),
            (self.worst, Grade::E),
        ];

        bands
            .into_iter()
            .find(|(ceiling, _)| average_total_time <= *ceiling)
            .map(|(_, grade)| grade)
            .unwrap_or(Grade::OffScale)
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// All thresholds used to color a report. Defaults match the public service's
/// own load time page, each part can be overridden from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classifier {
    pub connect: Thresholds,
    pub first_byte: Thresholds,
    pub total: Thresholds,
    pub grade: GradeScale,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            connect: Thresholds::CONNECT,
            first_byte: Thresholds::FIRST_BYTE,
            total: Thresholds::TOTAL,
            grade: GradeScale::DEFAULT,
        }
    }
}

impl Classifier {
    pub fn thresholds(&self, metric: Metric) -> &Thresholds {
        match metric {
            Metric::Connect => &self.connect,
            Metric::FirstByte => &self.first_byte,
            Metric::Total => &self.total,
        }
    }

    pub fn classify(&self, metric: Metric, value: f64) -> Band {
        self.thresholds(metric).band(value)
    }

    pub fn grade(&self, average_total_time: f64, failures: usize) -> Grade {
        self.grade.grade(average_total_time, failures)
    }
}

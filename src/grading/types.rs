use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Grade::A,
            70..=84 => Grade::B,
            55..=69 => Grade::C,
            40..=54 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellnessFocus {
    Balanced,
    MuscleBuilding,
    HeartHealth,
    EnergyEndurance,
    WeightManagement,
    BrainFocus,
    GutHealth,
    BloodSugarBalance,
    BoneJointSupport,
    AntiInflammatory,
}

impl WellnessFocus {
    pub const ALL: [WellnessFocus; 10] = [
        WellnessFocus::Balanced,
        WellnessFocus::MuscleBuilding,
        WellnessFocus::HeartHealth,
        WellnessFocus::EnergyEndurance,
        WellnessFocus::WeightManagement,
        WellnessFocus::BrainFocus,
        WellnessFocus::GutHealth,
        WellnessFocus::BloodSugarBalance,
        WellnessFocus::BoneJointSupport,
        WellnessFocus::AntiInflammatory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WellnessFocus::Balanced => "balanced",
            WellnessFocus::MuscleBuilding => "muscle_building",
            WellnessFocus::HeartHealth => "heart_health",
            WellnessFocus::EnergyEndurance => "energy_endurance",
            WellnessFocus::WeightManagement => "weight_management",
            WellnessFocus::BrainFocus => "brain_focus",
            WellnessFocus::GutHealth => "gut_health",
            WellnessFocus::BloodSugarBalance => "blood_sugar_balance",
            WellnessFocus::BoneJointSupport => "bone_joint_support",
            WellnessFocus::AntiInflammatory => "anti_inflammatory",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            WellnessFocus::Balanced => "a balanced diet",
            WellnessFocus::MuscleBuilding => "muscle building",
            WellnessFocus::HeartHealth => "heart health",
            WellnessFocus::EnergyEndurance => "energy and endurance",
            WellnessFocus::WeightManagement => "weight management",
            WellnessFocus::BrainFocus => "brain focus",
            WellnessFocus::GutHealth => "gut health",
            WellnessFocus::BloodSugarBalance => "blood sugar balance",
            WellnessFocus::BoneJointSupport => "bone and joint support",
            WellnessFocus::AntiInflammatory => "an anti-inflammatory diet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusScore {
    pub focus: WellnessFocus,
    pub score: u8,
    pub grade: Grade,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub insight: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatietyLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl SatietyLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => SatietyLevel::VeryLow,
            25..=44 => SatietyLevel::Low,
            45..=64 => SatietyLevel::Moderate,
            65..=79 => SatietyLevel::High,
            _ => SatietyLevel::VeryHigh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InflammatoryLevel {
    AntiInflammatory,
    Neutral,
    MildlyInflammatory,
    Inflammatory,
}

impl InflammatoryLevel {
    pub fn from_index(index: f64) -> Self {
        if index <= -0.5 {
            InflammatoryLevel::AntiInflammatory
        } else if index <= 0.2 {
            InflammatoryLevel::Neutral
        } else if index <= 0.7 {
            InflammatoryLevel::MildlyInflammatory
        } else {
            InflammatoryLevel::Inflammatory
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub score: u8,
    pub grade: Grade,
    /// Nutri-Score style point total; lower is better.
    pub nutri_score_points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satiety {
    pub score: u8,
    pub level: SatietyLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inflammatory {
    pub index: f64,
    pub level: InflammatoryLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub overall: OverallScore,
    pub focuses: Vec<FocusScore>,
    pub satiety: Satiety,
    pub inflammatory: Inflammatory,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    /// Score points added to blood_sugar_balance before weighting, when the
    /// GI was trustworthy enough to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gi_adjustment: Option<f64>,
}

impl GradingResult {
    pub fn focus(&self, focus: WellnessFocus) -> Option<&FocusScore> {
        self.focuses.iter().find(|f| f.focus == focus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_boundaries_are_exact() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(85), Grade::A);
        assert_eq!(Grade::from_score(84), Grade::B);
        assert_eq!(Grade::from_score(70), Grade::B);
        assert_eq!(Grade::from_score(69), Grade::C);
        assert_eq!(Grade::from_score(55), Grade::C);
        assert_eq!(Grade::from_score(54), Grade::D);
        assert_eq!(Grade::from_score(40), Grade::D);
        assert_eq!(Grade::from_score(39), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
    }

    #[test]
    fn grade_is_monotonic() {
        let mut last = Grade::F;
        for s in 0..=100u8 {
            let g = Grade::from_score(s);
            assert!(g <= last, "{s}");
            last = g;
        }
    }

    #[test]
    fn satiety_and_inflammatory_buckets() {
        assert_eq!(SatietyLevel::from_score(24), SatietyLevel::VeryLow);
        assert_eq!(SatietyLevel::from_score(25), SatietyLevel::Low);
        assert_eq!(SatietyLevel::from_score(45), SatietyLevel::Moderate);
        assert_eq!(SatietyLevel::from_score(65), SatietyLevel::High);
        assert_eq!(SatietyLevel::from_score(80), SatietyLevel::VeryHigh);

        assert_eq!(InflammatoryLevel::from_index(-0.5), InflammatoryLevel::AntiInflammatory);
        assert_eq!(InflammatoryLevel::from_index(0.2), InflammatoryLevel::Neutral);
        assert_eq!(InflammatoryLevel::from_index(0.7), InflammatoryLevel::MildlyInflammatory);
        assert_eq!(InflammatoryLevel::from_index(0.71), InflammatoryLevel::Inflammatory);
    }
}

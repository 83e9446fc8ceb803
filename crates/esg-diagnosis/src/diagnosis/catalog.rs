use super::domain::{ChoiceOption, EsgTopic, Indicator, PerformanceIndicator, SubQuestion};

/// Fixed set of scored indicators plus the quantitative KPI table.
///
/// Loaded once at startup and treated as immutable for the life of the
/// process.
#[derive(Debug)]
pub struct IndicatorCatalog {
    indicators: Vec<Indicator>,
    performance: Vec<PerformanceIndicator>,
}

impl IndicatorCatalog {
    pub fn standard() -> Self {
        Self {
            indicators: standard_indicators(),
            performance: standard_performance_indicators(),
        }
    }

    /// Catalog with a custom indicator set and the standard KPI table.
    pub fn with_indicators(indicators: Vec<Indicator>) -> Self {
        Self {
            indicators,
            performance: standard_performance_indicators(),
        }
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn indicators_for_topic(&self, topic: EsgTopic) -> Vec<&Indicator> {
        self.indicators
            .iter()
            .filter(|indicator| indicator.topic == topic)
            .collect()
    }

    pub fn find(&self, indicator_id: &str) -> Option<&Indicator> {
        self.indicators
            .iter()
            .find(|indicator| indicator.id == indicator_id)
    }

    pub fn performance_indicators(&self) -> &[PerformanceIndicator] {
        &self.performance
    }

    pub fn performance_category(&self, category: &str) -> Option<&PerformanceIndicator> {
        self.performance
            .iter()
            .find(|indicator| indicator.category == category)
    }
}

fn yes_no(sub_question_id: &'static str, text: &'static str) -> SubQuestion {
    SubQuestion {
        id: sub_question_id,
        text,
        allow_multiple: false,
        options: vec![
            ChoiceOption {
                id: "opt1",
                text: "Yes",
                points: 1,
                exclusive: false,
            },
            ChoiceOption {
                id: "opt2",
                text: "No",
                points: 0,
                exclusive: false,
            },
        ],
    }
}

fn standard_indicators() -> Vec<Indicator> {
    vec![
        // --- Environment ---
        Indicator {
            id: "E01",
            topic: EsgTopic::E,
            title: "Greenhouse gas emissions tracking",
            sub_questions: vec![yes_no(
                "Q1",
                "1. Does the company track its greenhouse gas emissions?",
            )],
        },
        Indicator {
            id: "E02",
            topic: EsgTopic::E,
            title: "Greenhouse gas reduction targets",
            sub_questions: vec![yes_no(
                "Q1",
                "2. Does the company set annual greenhouse gas reduction targets?",
            )],
        },
        Indicator {
            id: "E03",
            topic: EsgTopic::E,
            title: "Energy consumption tracking",
            sub_questions: vec![yes_no(
                "Q1",
                "3. Does the company track its annual energy consumption?",
            )],
        },
        Indicator {
            id: "E04",
            topic: EsgTopic::E,
            title: "Energy saving initiatives",
            sub_questions: vec![yes_no(
                "Q1",
                "4. Does the company run energy-saving initiatives such as adopting high-efficiency equipment?",
            )],
        },
        Indicator {
            id: "E05",
            topic: EsgTopic::E,
            title: "Waste management",
            sub_questions: vec![yes_no(
                "Q1",
                "5. Does the company track waste volumes and make recycling efforts?",
            )],
        },
        Indicator {
            id: "E06",
            topic: EsgTopic::E,
            title: "Environmental regulatory compliance",
            sub_questions: vec![yes_no(
                "Q1",
                "6. Has the company been free of environmental regulation violations over the past three years?",
            )],
        },
        // --- Social ---
        Indicator {
            id: "S01",
            topic: EsgTopic::S,
            title: "Occupational safety and health system",
            sub_questions: vec![yes_no(
                "Q1",
                "1. Has the company established an occupational safety and health management system as required by law?",
            )],
        },
        Indicator {
            id: "S02",
            topic: EsgTopic::S,
            title: "Safety and health training",
            sub_questions: vec![yes_no(
                "Q1",
                "2. Does the company run regular safety and health training for all employees?",
            )],
        },
        Indicator {
            id: "S03",
            topic: EsgTopic::S,
            title: "Standard employment contracts",
            sub_questions: vec![yes_no(
                "Q1",
                "3. Has the company signed and issued standard employment contracts with every employee?",
            )],
        },
        Indicator {
            id: "S04",
            topic: EsgTopic::S,
            title: "Non-discriminatory employment",
            sub_questions: vec![yes_no(
                "Q1",
                "4. Are hiring and promotion free of discrimination by gender, education, or age?",
            )],
        },
        Indicator {
            id: "S05",
            topic: EsgTopic::S,
            title: "Supply chain ESG risk management",
            sub_questions: vec![yes_no(
                "Q1",
                "5. Does the company assess ESG risks (environment, human rights) at its key suppliers?",
            )],
        },
        // --- Governance ---
        Indicator {
            id: "G01",
            topic: EsgTopic::G,
            title: "Corporate ethics policy",
            sub_questions: vec![yes_no(
                "Q1",
                "1. Does the company have a code of ethics or conduct that officers and employees must follow?",
            )],
        },
        Indicator {
            id: "G02",
            topic: EsgTopic::G,
            title: "Ethics training",
            sub_questions: vec![yes_no(
                "Q1",
                "2. Does the company run regular ethics training for officers and employees?",
            )],
        },
        Indicator {
            id: "G03",
            topic: EsgTopic::G,
            title: "Information security policy",
            sub_questions: vec![yes_no(
                "Q1",
                "3. Does the company have an information security policy protecting its information assets?",
            )],
        },
        Indicator {
            id: "G04",
            topic: EsgTopic::G,
            title: "ESG disclosure",
            sub_questions: vec![yes_no(
                "Q1",
                "4. Does the company publish ESG activities or information, for example on its website?",
            )],
        },
        Indicator {
            id: "G05",
            topic: EsgTopic::G,
            title: "Board-level ESG oversight",
            sub_questions: vec![yes_no(
                "Q1",
                "5. Are ESG matters reported to the board of directors or top management?",
            )],
        },
    ]
}

fn standard_performance_indicators() -> Vec<PerformanceIndicator> {
    vec![
        // --- Environment ---
        PerformanceIndicator {
            no: 1,
            category: "Greenhouse gas emissions",
            unit: "tCO2-eq",
            notes: "Scope 1 + Scope 2",
        },
        PerformanceIndicator {
            no: 2,
            category: "Energy consumption",
            unit: "MWh",
            notes: "Electricity, gas, and fuel",
        },
        PerformanceIndicator {
            no: 3,
            category: "Renewable energy generated",
            unit: "MWh",
            notes: "",
        },
        PerformanceIndicator {
            no: 4,
            category: "Renewable energy consumed",
            unit: "MWh",
            notes: "",
        },
        PerformanceIndicator {
            no: 5,
            category: "Water consumption",
            unit: "t",
            notes: "",
        },
        PerformanceIndicator {
            no: 6,
            category: "Wastewater discharged",
            unit: "t",
            notes: "",
        },
        PerformanceIndicator {
            no: 7,
            category: "Waste generated",
            unit: "t",
            notes: "Municipal + industrial",
        },
        PerformanceIndicator {
            no: 8,
            category: "Waste recycled",
            unit: "t",
            notes: "",
        },
        PerformanceIndicator {
            no: 9,
            category: "Air pollutant emissions",
            unit: "kg",
            notes: "NOx, SOx, and dust",
        },
        // --- Social ---
        PerformanceIndicator {
            no: 10,
            category: "Total employees",
            unit: "persons",
            notes: "Permanent + temporary",
        },
        PerformanceIndicator {
            no: 11,
            category: "Female employees",
            unit: "persons",
            notes: "",
        },
        PerformanceIndicator {
            no: 12,
            category: "Female managers",
            unit: "persons",
            notes: "",
        },
        PerformanceIndicator {
            no: 13,
            category: "New hires",
            unit: "persons",
            notes: "",
        },
        PerformanceIndicator {
            no: 14,
            category: "Departures",
            unit: "persons",
            notes: "",
        },
        PerformanceIndicator {
            no: 15,
            category: "Workplace accidents",
            unit: "cases",
            notes: "",
        },
        PerformanceIndicator {
            no: 16,
            category: "Training hours per employee",
            unit: "h/person",
            notes: "Total training hours / headcount",
        },
        PerformanceIndicator {
            no: 17,
            category: "Community investment",
            unit: "USD thousands",
            notes: "",
        },
        // --- Governance ---
        PerformanceIndicator {
            no: 18,
            category: "Board meetings held",
            unit: "count",
            notes: "",
        },
        PerformanceIndicator {
            no: 19,
            category: "Board attendance rate",
            unit: "%",
            notes: "",
        },
        PerformanceIndicator {
            no: 20,
            category: "Employees completing ethics training",
            unit: "%",
            notes: "",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_covers_all_topics() {
        let catalog = IndicatorCatalog::standard();

        assert_eq!(catalog.indicators_for_topic(EsgTopic::E).len(), 6);
        assert_eq!(catalog.indicators_for_topic(EsgTopic::S).len(), 5);
        assert_eq!(catalog.indicators_for_topic(EsgTopic::G).len(), 5);
        assert_eq!(catalog.performance_indicators().len(), 20);
    }

    #[test]
    fn every_indicator_has_a_positive_ceiling() {
        let catalog = IndicatorCatalog::standard();

        for indicator in catalog.indicators() {
            for sub_question in &indicator.sub_questions {
                assert!(
                    sub_question.max_points() > 0,
                    "indicator {} has a zero-weight sub-question",
                    indicator.id
                );
            }
        }
    }

    #[test]
    fn find_resolves_known_and_unknown_ids() {
        let catalog = IndicatorCatalog::standard();

        assert!(catalog.find("E01").is_some());
        assert!(catalog.find("X99").is_none());
        assert!(catalog.performance_category("Energy consumption").is_some());
        assert!(catalog.performance_category("Unheard-of KPI").is_none());
    }
}

//! Community ranking by eco-points.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenStanding {
    pub id: String,
    pub name: String,
    pub eco_points: u64,
    #[serde(default)]
    pub total_wet_waste: f64,
    #[serde(default)]
    pub total_plastic_waste: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RankBadge {
    Gold,
    Silver,
    Bronze,
    Numbered(usize),
}

impl RankBadge {
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => RankBadge::Gold,
            2 => RankBadge::Silver,
            3 => RankBadge::Bronze,
            n => RankBadge::Numbered(n),
        }
    }

    pub fn label(&self) -> String {
        match self {
            RankBadge::Gold => "🥇".to_string(),
            RankBadge::Silver => "🥈".to_string(),
            RankBadge::Bronze => "🥉".to_string(),
            RankBadge::Numbered(n) => format!("#{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCitizen {
    pub rank: usize,
    pub badge: RankBadge,
    pub standing: CitizenStanding,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySummary {
    pub total_points: u64,
    pub total_waste: f64,
}

#[derive(Deserialize)]
struct StandingsFile {
    citizens: Vec<CitizenStanding>,
}

/// Load standings from a JSON fixture of the form `{"citizens": [...]}`.
pub fn load_standings(path: &Path) -> Result<Vec<CitizenStanding>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read standings from {}", path.display()))?;
    let file: StandingsFile = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse standings in {}", path.display()))?;
    Ok(file.citizens)
}

/// Highest eco-points first; ties keep their input order.
pub fn rank_citizens(citizens: &[CitizenStanding]) -> Vec<RankedCitizen> {
    let mut sorted = citizens.to_vec();
    sorted.sort_by(|a, b| b.eco_points.cmp(&a.eco_points));

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, standing)| RankedCitizen {
            rank: index + 1,
            badge: RankBadge::for_rank(index + 1),
            standing,
        })
        .collect()
}

pub fn community_summary(citizens: &[CitizenStanding]) -> CommunitySummary {
    CommunitySummary {
        total_points: citizens.iter().map(|c| c.eco_points).sum(),
        total_waste: citizens
            .iter()
            .map(|c| c.total_wet_waste + c.total_plastic_waste)
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn standing(id: &str, points: u64) -> CitizenStanding {
        CitizenStanding {
            id: id.to_string(),
            name: format!("Citizen {id}"),
            eco_points: points,
            total_wet_waste: 1.5,
            total_plastic_waste: 2.0,
        }
    }

    #[test]
    fn test_rank_sorts_descending_and_keeps_ties_stable() {
        let citizens = vec![
            standing("a", 40),
            standing("b", 90),
            standing("c", 40),
            standing("d", 10),
        ];
        let ranked = rank_citizens(&citizens);
        let ids: Vec<_> = ranked.iter().map(|r| r.standing.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
        assert_eq!(ranked[0].badge, RankBadge::Gold);
        assert_eq!(ranked[2].badge, RankBadge::Bronze);
        assert_eq!(ranked[3].badge.label(), "#4");
    }

    #[test]
    fn test_community_summary_totals() {
        let citizens = vec![standing("a", 40), standing("b", 60)];
        let summary = community_summary(&citizens);
        assert_eq!(summary.total_points, 100);
        assert_eq!(summary.total_waste, 7.0);
    }

    #[test]
    fn test_load_standings_from_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"citizens": [{{"id": "1", "name": "Asha", "ecoPoints": 320, "totalWetWaste": 12.5, "totalPlasticWaste": 8}}]}}"#
        )
        .unwrap();

        let standings = load_standings(file.path()).unwrap();
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].eco_points, 320);
        assert_eq!(standings[0].total_plastic_waste, 8.0);
    }
}

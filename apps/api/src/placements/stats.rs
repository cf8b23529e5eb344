//! Summary statistics over a college's placement records.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::placement::PlacementRow;

const TOP_RECRUITERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecruiterCount {
    pub company: String,
    pub hires: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementStats {
    pub total_placements: u32,
    pub distinct_companies: u32,
    /// Mean over rows that carry a package, rounded to 2 decimals.
    pub average_package_lpa: Option<f64>,
    pub highest_package_lpa: Option<f64>,
    pub per_year: BTreeMap<i32, u32>,
    pub top_recruiters: Vec<RecruiterCount>,
}

pub fn compute_stats(rows: &[PlacementRow]) -> PlacementStats {
    let packages: Vec<f64> = rows.iter().filter_map(|r| r.package_lpa).collect();
    let average_package_lpa = (!packages.is_empty()).then(|| {
        let mean = packages.iter().sum::<f64>() / packages.len() as f64;
        (mean * 100.0).round() / 100.0
    });
    let highest_package_lpa = packages.iter().copied().reduce(f64::max);

    let mut per_year = BTreeMap::new();
    for year in rows.iter().filter_map(|r| r.placement_year) {
        *per_year.entry(year).or_insert(0) += 1;
    }

    // Company names are grouped case-insensitively; the first spelling seen is reported.
    let mut hires: HashMap<String, (String, u32)> = HashMap::new();
    for row in rows {
        let company = row.company.trim();
        let entry = hires
            .entry(company.to_lowercase())
            .or_insert_with(|| (company.to_string(), 0));
        entry.1 += 1;
    }
    let distinct_companies = hires.len() as u32;

    let mut top_recruiters: Vec<RecruiterCount> = hires
        .into_values()
        .map(|(company, hires)| RecruiterCount { company, hires })
        .collect();
    top_recruiters.sort_by(|a, b| b.hires.cmp(&a.hires).then_with(|| a.company.cmp(&b.company)));
    top_recruiters.truncate(TOP_RECRUITERS);

    PlacementStats {
        total_placements: rows.len() as u32,
        distinct_companies,
        average_package_lpa,
        highest_package_lpa,
        per_year,
        top_recruiters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn row(company: &str, package: Option<f64>, year: Option<i32>) -> PlacementRow {
        PlacementRow {
            id: Uuid::new_v4(),
            college_id: Uuid::nil(),
            student_name: "Student".to_string(),
            company: company.to_string(),
            role: None,
            package_lpa: package,
            placement_year: year,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_placements, 0);
        assert_eq!(stats.distinct_companies, 0);
        assert_eq!(stats.average_package_lpa, None);
        assert_eq!(stats.highest_package_lpa, None);
        assert!(stats.top_recruiters.is_empty());
    }

    #[test]
    fn test_aggregates() {
        let rows = vec![
            row("Infosys", Some(6.0), Some(2023)),
            row("infosys ", Some(7.0), Some(2024)),
            row("TCS", Some(4.5), Some(2024)),
            row("Zoho", None, None),
        ];
        let stats = compute_stats(&rows);
        assert_eq!(stats.total_placements, 4);
        assert_eq!(stats.distinct_companies, 3);
        assert_eq!(stats.average_package_lpa, Some(5.83));
        assert_eq!(stats.highest_package_lpa, Some(7.0));
        assert_eq!(stats.per_year.get(&2024), Some(&2));
        assert_eq!(stats.per_year.get(&2023), Some(&1));
        assert_eq!(
            stats.top_recruiters[0],
            RecruiterCount {
                company: "Infosys".to_string(),
                hires: 2
            }
        );
    }

    #[test]
    fn test_top_recruiters_capped_and_tie_broken_by_name() {
        let rows: Vec<PlacementRow> = ["F", "E", "D", "C", "B", "A", "A"]
            .iter()
            .map(|c| row(c, None, None))
            .collect();
        let names: Vec<String> = compute_stats(&rows)
            .top_recruiters
            .into_iter()
            .map(|r| r.company)
            .collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    }
}

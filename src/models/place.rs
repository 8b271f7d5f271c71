//! Place record data structure.

use serde::{Deserialize, Serialize};

/// A business listing extracted from one resolved query.
///
/// Field names and their order are part of the output format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub name: String,
    pub category: String,
    pub address: String,
    pub website: String,
    pub phone: String,
    pub review_count: u64,
    pub stars: f64,

    #[serde(rename = "5_stars")]
    pub five_stars: u64,
    #[serde(rename = "4_stars")]
    pub four_stars: u64,
    #[serde(rename = "3_stars")]
    pub three_stars: u64,
    #[serde(rename = "2_stars")]
    pub two_stars: u64,
    #[serde(rename = "1_star")]
    pub one_star: u64,

    /// Review texts in the order they were rendered
    pub reviews: Vec<String>,

    /// `"lat,lon"` taken from the listing URL, empty if unknown
    pub latlon: String,
}

impl Place {
    /// Set a star-bucket count by its star value (1..=5). Other values are ignored.
    pub fn set_bucket(&mut self, stars: u8, count: u64) {
        match stars {
            5 => self.five_stars = count,
            4 => self.four_stars = count,
            3 => self.three_stars = count,
            2 => self.two_stars = count,
            1 => self.one_star = count,
            _ => {}
        }
    }
}

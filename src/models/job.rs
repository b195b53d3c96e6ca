use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::availability::AvailabilityWindow;
use super::pet::PetSize;

/// A service offered by the shop (bath, grooming, vet check...), priced
/// per pet size tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_small: Decimal,
    pub price_medium: Decimal,
    pub price_large: Decimal,
    pub duration_minutes: i32,
    pub windows: Vec<AvailabilityWindow>,
    pub created_at: NaiveDateTime,
}

impl Job {
    /// Tiered price lookup. Pure; unknown sizes never reach here because
    /// `PetSize::parse` collapses them to Medium.
    pub fn price_for(&self, size: PetSize) -> Decimal {
        match size {
            PetSize::Small => self.price_small,
            PetSize::Medium => self.price_medium,
            PetSize::Large => self.price_large,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(small: i64, medium: i64, large: i64) -> Job {
        Job {
            id: "job-1".to_string(),
            name: "Grooming".to_string(),
            description: String::new(),
            price_small: Decimal::from(small),
            price_medium: Decimal::from(medium),
            price_large: Decimal::from(large),
            duration_minutes: 60,
            windows: vec![],
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_price_for_each_tier() {
        let j = job(50, 60, 70);
        assert_eq!(j.price_for(PetSize::Small), Decimal::from(50));
        assert_eq!(j.price_for(PetSize::Medium), Decimal::from(60));
        assert_eq!(j.price_for(PetSize::Large), Decimal::from(70));
    }

    #[test]
    fn test_unknown_size_prices_as_medium() {
        let j = job(50, 60, 70);
        assert_eq!(j.price_for(PetSize::parse("weird")), Decimal::from(60));
    }
}

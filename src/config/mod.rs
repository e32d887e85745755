//! Business configuration loaded once at start: villages, product types,
//! default pricing, the weekday → village table, and seed customers.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::core::utils::{ensure_dir, write_atomic, PathResolver};
use crate::domain::{
    CustomerBook, DayAssignment, DayOfWeek, DayVillageTable, PackageRate, PricingTable,
};
use crate::errors::{Result, SalesError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub brand_name: String,
    pub villages: Vec<String>,
    pub tea_types: Vec<String>,
    pub default_pricing: PricingTable,
    pub day_villages: DayVillageTable,
    pub seed_customers: CustomerBook,
    /// Number of entries shown by `sale list` when no count is given.
    pub recent_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for the record store. Defaults to `<home>/data`.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brand_name: "GOLD Tea Powder".into(),
            villages: vec![
                "vairgwadi".into(),
                "Bardwadi".into(),
                "Harali KH".into(),
                "Harali BK".into(),
                "Other Village 1".into(),
                "Other Village 2".into(),
            ],
            tea_types: vec!["Mix".into(), "Barik".into()],
            default_pricing: Self::default_pricing_table(),
            day_villages: DayVillageTable::new([
                DayAssignment::new(DayOfWeek::Monday, "Harali KH"),
                DayAssignment::new(DayOfWeek::Friday, "Bardwadi"),
                DayAssignment::new(DayOfWeek::Saturday, "vairgwadi"),
                DayAssignment::new(DayOfWeek::Sunday, "Harali BK"),
            ]),
            seed_customers: Self::default_seed_customers(),
            recent_entries: 5,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_pricing_table() -> PricingTable {
        PricingTable::from_entries([
            PackageRate::new("100gm", 35),
            PackageRate::new("250gm", 85),
            PackageRate::new("500gm", 170),
            PackageRate::new("1kg", 350),
        ])
    }

    pub fn default_seed_customers() -> CustomerBook {
        CustomerBook::from_entries([
            (
                "vairgwadi",
                vec![
                    "Rajesh Kumar",
                    "Suresh Patil",
                    "Mahesh Desai",
                    "Prakash Sharma",
                    "Dinesh Joshi",
                    "Ramesh Gupta",
                    "Vijay Kulkarni",
                    "Anil Bhosale",
                    "Santosh Pawar",
                    "Ganesh Rao",
                ],
            ),
            (
                "Bardwadi",
                vec![
                    "Sanjay Jadhav",
                    "Ashok Shinde",
                    "Deepak Mane",
                    "Nitin Salve",
                    "Sachin More",
                    "Ravi Bhagat",
                    "Kiran Kale",
                    "Manoj Gaikwad",
                    "Vishal Sawant",
                    "Ajay Thorat",
                ],
            ),
            (
                "Harali KH",
                vec![
                    "Balaji Naik",
                    "Sambhaji Rathod",
                    "Chandrakant Mali",
                    "Datta Kamble",
                    "Eknath Pawar",
                    "Govind Shinde",
                    "Hanmant Jadhav",
                    "Ishwar Patil",
                    "Jagdish Yadav",
                    "Keshav Deshmukh",
                ],
            ),
            (
                "Harali BK",
                vec![
                    "Laxman Gaikwad",
                    "Maruti Bhosale",
                    "Nagnath Kadam",
                    "Pandurang Mane",
                    "Ramdas Salve",
                    "Shankar Kulkarni",
                    "Tanaji More",
                    "Uttam Shinde",
                    "Vasant Jadhav",
                    "Yashwant Pawar",
                ],
            ),
            ("Other Village 1", Vec::new()),
            ("Other Village 2", Vec::new()),
        ])
    }

    /// Resolves the record store directory beneath `base` unless overridden.
    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathResolver::data_dir_in(base))
    }

    pub fn has_village(&self, village: &str) -> bool {
        let village = village.trim();
        self.villages.iter().any(|known| known == village)
    }

    pub fn validate(&self) -> Result<()> {
        if self.villages.is_empty() {
            return Err(SalesError::Config("at least one village is required".into()));
        }
        if self.tea_types.is_empty() {
            return Err(SalesError::Config("at least one tea type is required".into()));
        }
        for entry in self.day_villages.entries() {
            if !self.has_village(&entry.village) {
                return Err(SalesError::Config(format!(
                    "{} is assigned to unknown village `{}`",
                    entry.day, entry.village
                )));
            }
        }
        let mut labels = HashSet::new();
        for entry in self.default_pricing.iter() {
            if entry.rate == 0 {
                return Err(SalesError::Config(format!(
                    "default rate for `{}` must be positive",
                    entry.package
                )));
            }
            if !labels.insert(entry.package.as_str()) {
                return Err(SalesError::Config(format!(
                    "package `{}` is listed twice",
                    entry.package
                )));
            }
        }
        Ok(())
    }
}

/// Handles persistence for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        let config_root = PathResolver::config_dir_in(&base);
        ensure_dir(&config_root).map_err(|err| SalesError::Config(err.to_string()))?;
        Ok(Self::new(PathResolver::config_file_in(&base)))
    }

    /// Loads the configuration, falling back to defaults when no file exists.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data =
            fs::read_to_string(&self.path).map_err(|err| SalesError::Config(err.to_string()))?;
        let config: Config = serde_json::from_str(&data).map_err(|err| {
            SalesError::Config(format!("{}: {}", self.path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json).map_err(|err| SalesError::Config(err.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.default_pricing.get("1kg"), Some(350));
        assert_eq!(config.seed_customers.names("Bardwadi").len(), 10);
        assert!(config.seed_customers.names("Other Village 1").is_empty());
    }

    #[test]
    fn validate_rejects_unknown_day_village() {
        let mut config = Config::default();
        config.day_villages = DayVillageTable::new([DayAssignment::new(
            DayOfWeek::Tuesday,
            "Atlantis",
        )]);
        assert!(matches!(config.validate(), Err(SalesError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_default_rate() {
        let mut config = Config::default();
        config.default_pricing.upsert("100gm", 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn manager_roundtrips_and_defaults_missing_fields() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("manager");
        assert_eq!(manager.load().unwrap(), Config::default());

        let mut config = Config::default();
        config.brand_name = "Silver Tea".into();
        manager.save(&config).expect("save");
        assert_eq!(manager.load().unwrap().brand_name, "Silver Tea");

        fs::write(manager.path(), r#"{ "tea_types": ["Mix"] }"#).unwrap();
        let partial = manager.load().unwrap();
        assert_eq!(partial.tea_types, vec!["Mix".to_string()]);
        assert_eq!(partial.villages.len(), 6);
    }

    #[test]
    fn manager_reports_malformed_file() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("manager");
        fs::write(manager.path(), "{ not json").unwrap();
        assert!(matches!(manager.load(), Err(SalesError::Config(_))));
    }
}

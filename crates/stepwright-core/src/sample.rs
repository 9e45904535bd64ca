//! Sample lead data for form-filling test cases.

use rand::Rng;

use crate::vars::VariableMap;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin",
];

/// A generated lead: name, email, and a US-format phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl LeadData {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first_name = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())].to_string();
        let last_name = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())].to_string();
        let email = format!(
            "{}.{}{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            rng.gen_range(1..1000)
        );
        let phone = Self::generate_phone(rng);
        Self {
            first_name,
            last_name,
            email,
            phone,
        }
    }

    /// `(XXX) XXX-XXXX` with area code and prefix in the valid 200-999 range.
    fn generate_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
        let area_code = rng.gen_range(200..=999);
        let prefix = rng.gen_range(200..=999);
        let line = rng.gen_range(1000..=9999);
        format!("({}) {}-{}", area_code, prefix, line)
    }

    /// Variable map entries matching the placeholders used by lead-creation
    /// test cases.
    pub fn into_vars(self) -> VariableMap {
        VariableMap::from([
            ("FIRST_NAME".to_string(), self.first_name),
            ("LAST_NAME".to_string(), self.last_name),
            ("EMAIL".to_string(), self.email),
            ("PHONE".to_string(), self.phone),
        ])
    }
}

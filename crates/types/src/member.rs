use serde::{Deserialize, Serialize};

/// A SACCO member record as listed by the backend; used to pick the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: u64,
    #[serde(default)]
    pub member_number: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Member {
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full_name = full_name.trim();
        match (&self.member_number, full_name.is_empty()) {
            (Some(number), false) => format!("{} ({})", full_name, number),
            (Some(number), true) => number.clone(),
            (None, false) => full_name.to_string(),
            (None, true) => format!("member #{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_full_name_with_number() {
        let member: Member = serde_json::from_value(serde_json::json!({
            "id": 7,
            "memberNumber": "M-007",
            "firstName": "Amina",
            "lastName": "Otieno"
        }))
        .unwrap();
        assert_eq!(member.display_name(), "Amina Otieno (M-007)");
    }

    #[test]
    fn display_name_falls_back_to_identifier() {
        let member: Member = serde_json::from_value(serde_json::json!({ "id": 3 })).unwrap();
        assert_eq!(member.display_name(), "member #3");
    }
}

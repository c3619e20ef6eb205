//! Cycle entities and mutation inputs.

use domain::{CompanyId, CustomerId, DocId, ReleaseId, ReleaseNoteId, Timestamp};
use serde::{Deserialize, Serialize};

/// A company in a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    /// Annual recurring revenue.
    #[serde(default)]
    pub arr: Option<f64>,
    #[serde(default)]
    pub number_of_employees: Option<u32>,
    #[serde(default)]
    pub zendesk_id: Option<String>,
    #[serde(default)]
    pub hubspot_id: Option<String>,
    #[serde(default)]
    pub intercom_id: Option<String>,
    #[serde(default)]
    pub pipedrive_id: Option<String>,
    #[serde(default)]
    pub snowflake_id: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
}

/// The company a customer belongs to, as embedded in customer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCompany {
    pub id: CompanyId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A person attached to a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<CustomerCompany>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNoteCover {
    pub id: String,
    pub url: String,
}

/// The document a release note was written from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRef {
    pub id: DocId,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNote {
    pub id: ReleaseNoteId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover: Option<ReleaseNoteCover>,
    /// Listed under "other" rather than as a main note.
    #[serde(default)]
    pub is_other: bool,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub doc: Option<DocRef>,
}

/// A feedback document as returned by `createFeedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: DocId,
    #[serde(default)]
    pub title: Option<String>,
    /// The customer the feedback was attributed to.
    #[serde(default)]
    pub customer: Option<Customer>,
}

/// A feedback document to create.
///
/// Attribution goes to `company_name` when set, otherwise to
/// `customer_email`; Cycle creates the company or customer if needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFeedback {
    pub title: String,
    /// HTML body.
    pub content: Option<String>,
    /// Link back to where the feedback came from.
    pub source_url: String,
    pub company_name: Option<String>,
    pub customer_email: Option<String>,
}

/// Identifiers of a company in third-party tools.
///
/// Serialized as Cycle's `ExternalCompanyInput`; unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalCompanyIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zendesk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hubspot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intercom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipedrive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snowflake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

impl ExternalCompanyIds {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Fields to change on a company. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub arr: Option<f64>,
    pub number_of_employees: Option<u32>,
    pub external_ids: ExternalCompanyIds,
}

impl CompanyUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.domain.is_none()
            && self.arr.is_none()
            && self.number_of_employees.is_none()
            && self.external_ids.is_empty()
    }
}

/// Fields to change on a customer. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Moves the customer to another company.
    pub company: Option<CompanyId>,
}

impl CustomerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.company.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn company_tolerates_missing_optional_fields() {
        let company: Company =
            serde_json::from_value(json!({"id": "Q29tcGFueV8x", "name": "Acme", "arr": null}))
                .unwrap();
        assert_eq!(company.name, "Acme");
        assert!(company.arr.is_none());
        assert!(company.hubspot_id.is_none());
    }

    #[test]
    fn release_date_parses_as_timestamp() {
        let release: Release = serde_json::from_value(json!({
            "id": "UmVsZWFzZV8x",
            "title": "Spring",
            "date": "2024-03-20T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(
            release.date.map(|date| date.to_string()),
            Some("2024-03-20T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn external_ids_omit_unset_tools() {
        let ids = ExternalCompanyIds {
            hubspot: Some("hs-1".to_string()),
            ..ExternalCompanyIds::default()
        };
        assert_eq!(serde_json::to_value(&ids).unwrap(), json!({"hubspot": "hs-1"}));
        assert!(ExternalCompanyIds::default().is_empty());
    }

    #[test]
    fn empty_updates_are_detected() {
        assert!(CompanyUpdate::default().is_empty());
        assert!(!CompanyUpdate {
            arr: Some(1200.0),
            ..CompanyUpdate::default()
        }
        .is_empty());
        assert!(CustomerUpdate::default().is_empty());
    }
}

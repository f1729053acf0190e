use models::SalesProject;

/// One offer row on the project page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeadOfferOverview {
    pub offer_id: String,
    pub ordered: bool,
}

/// Summary of a sales project and its offers as shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SalesOverview {
    pub sales_project_id: String,
    pub project_name: String,
    pub lead_offer_overviews: Vec<LeadOfferOverview>,
}

impl SalesOverview {
    /// Builds the overview from a loaded project; the ordered offer is marked as such.
    pub fn from_project(sales_project: &SalesProject) -> Self {
        let ordered_offer_id = sales_project.ordered_offer_id();
        Self {
            sales_project_id: sales_project.id().unwrap_or_default().to_string(),
            project_name: sales_project.project_name.clone(),
            lead_offer_overviews: sales_project
                .offer_ids
                .iter()
                .map(|offer_id| LeadOfferOverview {
                    offer_id: offer_id.clone(),
                    ordered: ordered_offer_id == Some(offer_id.as_str()),
                })
                .collect(),
        }
    }

    pub fn remove_offer(&mut self, offer_id: &str) {
        self.lead_offer_overviews.retain(|o| o.offer_id != offer_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::RestApiModel;
    use serde_json::json;

    #[test]
    fn ordered_offer_is_marked() {
        let project = SalesProject::from_json(&json!({
            "id": "p-1",
            "projectName": "Fiber",
            "offerIds": ["o-1", "o-2"],
            "orderedOfferId": "o-2"
        }))
        .unwrap();

        let overview = SalesOverview::from_project(&project);
        assert_eq!(overview.sales_project_id, "p-1");
        assert_eq!(overview.project_name, "Fiber");
        assert!(!overview.lead_offer_overviews[0].ordered);
        assert!(overview.lead_offer_overviews[1].ordered);
    }
}

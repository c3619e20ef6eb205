//! Typed Cycle operations over a [`RequestExecutor`].

use domain::{
    CompanyId, Connection, Cursor, CustomerId, ExecutionError, Operation, Page, PageSize,
    ReleaseId, WorkspaceId, WorkspaceSlug,
};
use graphql::RequestExecutor;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::models::{
    Company, CompanyUpdate, Customer, CustomerUpdate, Feedback, NewFeedback, Release, ReleaseNote,
};
use crate::queries;

/// Public Cycle GraphQL endpoint.
pub const CYCLE_ENDPOINT: &str = "https://api.product.cycle.app/graphql";

/// Cycle API client.
///
/// Every call goes through the wrapped executor, so retries, timeouts and
/// cancellation apply uniformly. GraphQL `errors` in a response always fail
/// the call.
#[derive(Debug, Clone)]
pub struct CycleClient {
    executor: RequestExecutor,
}

#[derive(Deserialize)]
struct NodeData<N> {
    node: Option<N>,
}

#[derive(Deserialize)]
struct IdOnly<I> {
    id: I,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceBySlugData {
    get_product_by_slug: Option<IdOnly<WorkspaceId>>,
}

#[derive(Deserialize)]
struct CompaniesNode {
    companies: Connection<Company>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCompanyData {
    create_company: Company,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCompanyData {
    update_company: Company,
}

#[derive(Deserialize)]
struct CustomersNode {
    customers: Connection<Customer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCustomerData {
    update_customer: Customer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveCustomerData {
    remove_customer: IdOnly<CustomerId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFeedbackData {
    create_feedback: Feedback,
}

#[derive(Deserialize)]
struct ReleasesNode {
    releases: Connection<Release>,
}

#[derive(Deserialize)]
struct ReleaseNotesData {
    release: Option<ReleaseNotesNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseNotesNode {
    release_notes: Connection<ReleaseNote>,
}

impl CycleClient {
    /// Wraps an executor already pointed at a Cycle endpoint.
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// The executor, for operations this client has no method for.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Resolves a workspace slug to its id. `None` when no workspace has that slug.
    #[instrument(skip_all, fields(slug = %slug))]
    pub async fn workspace_id(
        &self,
        slug: &WorkspaceSlug,
    ) -> Result<Option<WorkspaceId>, ExecutionError> {
        let operation = Operation::new(queries::WORKSPACE_BY_SLUG)
            .with_operation_name("workspaceBySlug")
            .with_variable("slug", slug.as_str());
        let data: WorkspaceBySlugData = self.executor.execute_data(&operation).await?;
        Ok(data.get_product_by_slug.map(|product| product.id))
    }

    /// One page of the workspace's companies, optionally filtered by `search`.
    #[instrument(skip_all, fields(workspace = %workspace, cursor = %cursor))]
    pub async fn companies_page(
        &self,
        workspace: &WorkspaceId,
        cursor: Cursor,
        size: PageSize,
        search: Option<&str>,
    ) -> Result<Page<Company>, ExecutionError> {
        let operation = Operation::new(queries::companies())
            .with_operation_name("getCompanies")
            .with_variable("productId", workspace)
            .with_optional_variable("searchText", search)
            .with_variable("size", size)
            .with_variable("cursor", &cursor);
        let data: NodeData<CompaniesNode> = self.executor.execute_data(&operation).await?;
        Ok(node_page(data.node.map(|node| node.companies), "companies"))
    }

    /// Creates a company with only a name; other fields go through [`Self::update_company`].
    #[instrument(skip_all, fields(workspace = %workspace))]
    pub async fn create_company(
        &self,
        workspace: &WorkspaceId,
        name: &str,
    ) -> Result<Company, ExecutionError> {
        let operation = Operation::new(queries::create_company())
            .with_operation_name("CreateCompany")
            .with_variable("productId", workspace)
            .with_variable("name", name);
        let data: CreateCompanyData = self.executor.execute_data(&operation).await?;
        debug!(company = %data.create_company.id, "company created");
        Ok(data.create_company)
    }

    /// Applies `update`. Only the fields it sets are sent.
    #[instrument(skip_all, fields(company = %company))]
    pub async fn update_company(
        &self,
        company: &CompanyId,
        update: &CompanyUpdate,
    ) -> Result<Company, ExecutionError> {
        let external_ids = if update.external_ids.is_empty() {
            None
        } else {
            Some(
                serde_json::to_value(&update.external_ids).map_err(|err| {
                    ExecutionError::Configuration {
                        message: format!("external ids could not be encoded: {err}"),
                    }
                })?,
            )
        };
        let operation = Operation::new(queries::update_company())
            .with_operation_name("updateCompany")
            .with_variable("companyId", company)
            .with_optional_variable("name", update.name.as_deref())
            .with_optional_variable("domain", update.domain.as_deref())
            .with_optional_variable("arr", update.arr)
            .with_optional_variable("numberOfEmployees", update.number_of_employees)
            .with_optional_variable("externalId", external_ids);
        let data: UpdateCompanyData = self.executor.execute_data(&operation).await?;
        Ok(data.update_company)
    }

    /// One page of the workspace's customers with their company.
    #[instrument(skip_all, fields(workspace = %workspace, cursor = %cursor))]
    pub async fn customers_page(
        &self,
        workspace: &WorkspaceId,
        cursor: Cursor,
        size: PageSize,
        search: Option<&str>,
    ) -> Result<Page<Customer>, ExecutionError> {
        let operation = customers_operation(workspace, &cursor, size, search);
        let data: NodeData<CustomersNode> = self.executor.execute_data(&operation).await?;
        Ok(node_page(data.node.map(|node| node.customers), "customers"))
    }

    /// Looks a customer up by email address.
    ///
    /// The API search is fuzzy, so the best hit is only returned when its
    /// email matches `email` ignoring ASCII case.
    #[instrument(skip_all, fields(workspace = %workspace))]
    pub async fn customer_by_email(
        &self,
        workspace: &WorkspaceId,
        email: &str,
    ) -> Result<Option<Customer>, ExecutionError> {
        let size = PageSize::new(10).unwrap_or_default();
        let operation = customers_operation(workspace, &Cursor::initial(), size, Some(email));
        let data: NodeData<CustomersNode> = self.executor.execute_data(&operation).await?;
        let found = node_page(data.node.map(|node| node.customers), "customers")
            .items
            .into_iter()
            .find(|customer| {
                customer
                    .email
                    .as_deref()
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(email))
            });
        if found.is_none() {
            debug!("no customer with that email");
        }
        Ok(found)
    }

    /// Applies `update`. Only the fields it sets are sent.
    #[instrument(skip_all, fields(customer = %customer))]
    pub async fn update_customer(
        &self,
        customer: &CustomerId,
        update: &CustomerUpdate,
    ) -> Result<Customer, ExecutionError> {
        let operation = Operation::new(queries::UPDATE_CUSTOMER)
            .with_operation_name("updateCustomer")
            .with_variable("customerId", customer)
            .with_optional_variable("name", update.name.as_deref())
            .with_optional_variable("email", update.email.as_deref())
            .with_optional_variable("companyId", update.company.as_ref());
        let data: UpdateCustomerData = self.executor.execute_data(&operation).await?;
        Ok(data.update_customer)
    }

    /// Deletes a customer and returns the id the API confirmed.
    #[instrument(skip_all, fields(customer = %customer))]
    pub async fn delete_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<CustomerId, ExecutionError> {
        let operation = Operation::new(queries::REMOVE_CUSTOMER)
            .with_operation_name("RemoveCustomer")
            .with_variable("customerId", customer);
        let data: RemoveCustomerData = self.executor.execute_data(&operation).await?;
        Ok(data.remove_customer.id)
    }

    /// Creates a feedback document in the workspace.
    #[instrument(skip_all, fields(workspace = %workspace))]
    pub async fn create_feedback(
        &self,
        workspace: &WorkspaceId,
        feedback: &NewFeedback,
    ) -> Result<Feedback, ExecutionError> {
        let company = feedback
            .company_name
            .as_deref()
            .map(|name| json!({ "name": name }));
        let customer_email = if company.is_some() {
            None
        } else {
            feedback.customer_email.as_deref()
        };
        let operation = Operation::new(queries::CREATE_FEEDBACK)
            .with_operation_name("createFeedback")
            .with_variable("workspaceId", workspace)
            .with_variable("title", feedback.title.as_str())
            .with_optional_variable("company", company)
            .with_optional_variable("customerEmail", customer_email)
            .with_variable(
                "source",
                json!({ "sourceWeb": { "url": feedback.source_url } }),
            )
            .with_optional_variable("content", feedback.content.as_deref());
        let data: CreateFeedbackData = self.executor.execute_data(&operation).await?;
        debug!(doc = %data.create_feedback.id, "feedback created");
        Ok(data.create_feedback)
    }

    /// One page of the workspace's releases.
    #[instrument(skip_all, fields(workspace = %workspace, cursor = %cursor))]
    pub async fn releases_page(
        &self,
        workspace: &WorkspaceId,
        cursor: Cursor,
        size: PageSize,
    ) -> Result<Page<Release>, ExecutionError> {
        let operation = Operation::new(queries::RELEASES)
            .with_operation_name("productReleases")
            .with_variable("workspaceId", workspace)
            .with_variable("size", size)
            .with_variable("cursor", &cursor);
        let data: NodeData<ReleasesNode> = self.executor.execute_data(&operation).await?;
        Ok(node_page(data.node.map(|node| node.releases), "releases"))
    }

    /// One page of a release's notes. An unknown release yields an empty page.
    #[instrument(skip_all, fields(release = %release, cursor = %cursor))]
    pub async fn release_notes_page(
        &self,
        release: &ReleaseId,
        cursor: Cursor,
        size: PageSize,
    ) -> Result<Page<ReleaseNote>, ExecutionError> {
        let operation = Operation::new(queries::RELEASE_NOTES)
            .with_operation_name("getReleaseNotes")
            .with_variable("releaseId", release)
            .with_variable("size", size)
            .with_variable("cursor", &cursor);
        let data: ReleaseNotesData = self.executor.execute_data(&operation).await?;
        Ok(node_page(
            data.release.map(|release| release.release_notes),
            "release notes",
        ))
    }
}

fn customers_operation(
    workspace: &WorkspaceId,
    cursor: &Cursor,
    size: PageSize,
    search: Option<&str>,
) -> Operation {
    Operation::new(queries::CUSTOMERS)
        .with_operation_name("productCustomers")
        .with_variable("workspaceId", workspace)
        .with_variable("size", size)
        .with_variable("cursor", cursor)
        .with_optional_variable("searchText", search)
}

// A null node means the id does not resolve to a node of the expected type.
// That is reported as an empty, final page rather than an error.
fn node_page<T>(connection: Option<Connection<T>>, what: &str) -> Page<T> {
    match connection {
        Some(connection) => connection.into(),
        None => {
            warn!(listing = what, "node not found; treating as an empty listing");
            Page::last(Vec::new())
        }
    }
}

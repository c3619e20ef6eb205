//! GraphQL documents sent to the Cycle API.

pub(crate) const WORKSPACE_BY_SLUG: &str = r"
query workspaceBySlug($slug: DefaultString!) {
  getProductBySlug(slug: $slug) {
    id
  }
}
";

const COMPANY_FIELDS: &str = r"
  id
  name
  domain
  arr
  numberOfEmployees
  zendeskId
  hubspotId
  intercomId
  pipedriveId
  snowflakeId
  customId
";

pub(crate) fn companies() -> String {
    format!(
        r"
query getCompanies($productId: ID!, $searchText: DefaultString, $size: Int!, $cursor: String!) {{
  node(id: $productId) {{
    ... on Product {{
      companies(
        searchText: $searchText
        pagination: {{size: $size, where: {{cursor: $cursor, direction: AFTER}}}}
      ) {{
        pageInfo {{
          hasNextPage
          endCursor
        }}
        edges {{
          node {{{COMPANY_FIELDS}}}
        }}
      }}
    }}
  }}
}}
"
    )
}

pub(crate) fn create_company() -> String {
    format!(
        r"
mutation CreateCompany($name: DefaultString!, $productId: ID!) {{
  createCompany(name: $name, productId: $productId) {{{COMPANY_FIELDS}}}
}}
"
    )
}

pub(crate) fn update_company() -> String {
    format!(
        r"
mutation updateCompany(
  $companyId: ID!,
  $name: String,
  $domain: String,
  $arr: Float,
  $numberOfEmployees: Int,
  $externalId: ExternalCompanyInput
) {{
  updateCompany(
    id: $companyId,
    name: $name,
    domain: $domain,
    arr: $arr,
    numberOfEmployees: $numberOfEmployees,
    externalId: $externalId
  ) {{{COMPANY_FIELDS}}}
}}
"
    )
}

pub(crate) const CUSTOMERS: &str = r"
query productCustomers($workspaceId: ID!, $size: Int!, $cursor: String!, $searchText: DefaultString) {
  node(id: $workspaceId) {
    ... on Product {
      customers(
        searchText: $searchText
        pagination: {size: $size, where: {cursor: $cursor, direction: AFTER}}
      ) {
        pageInfo {
          hasNextPage
          endCursor
        }
        edges {
          node {
            id
            name
            email
            company {
              id
              name
            }
          }
        }
      }
    }
  }
}
";

pub(crate) const UPDATE_CUSTOMER: &str = r"
mutation updateCustomer($customerId: ID!, $name: String, $email: EmailAddress, $companyId: ID) {
  updateCustomer(customerId: $customerId, name: $name, email: $email, companyId: $companyId) {
    id
    name
    email
    company {
      id
      name
    }
  }
}
";

pub(crate) const REMOVE_CUSTOMER: &str = r"
mutation RemoveCustomer($customerId: ID!) {
  removeCustomer(customerId: $customerId) {
    id
  }
}
";

pub(crate) const CREATE_FEEDBACK: &str = r"
mutation createFeedback(
  $workspaceId: ID!
  $title: DefaultString!
  $company: CompanyInput
  $customerEmail: EmailAddress
  $source: DocSourceInput!
  $content: DefaultString
) {
  createFeedback(
    productId: $workspaceId
    title: $title
    company: $company
    customer: $customerEmail
    source: $source
    contentHTML: $content
  ) {
    id
    title
    customer {
      id
      name
      email
      company {
        id
        name
      }
    }
  }
}
";

pub(crate) const RELEASES: &str = r"
query productReleases($workspaceId: ID!, $size: Int!, $cursor: String!) {
  node(id: $workspaceId) {
    ... on Product {
      releases(pagination: {size: $size, where: {cursor: $cursor, direction: AFTER}}) {
        pageInfo {
          hasNextPage
          endCursor
        }
        edges {
          cursor
          node {
            id
            date
            title
          }
        }
      }
    }
  }
}
";

pub(crate) const RELEASE_NOTES: &str = r"
query getReleaseNotes($releaseId: ID!, $size: Int!, $cursor: String!) {
  release: node(id: $releaseId) {
    ... on Release {
      id
      releaseNotes(pagination: {size: $size, where: {cursor: $cursor, direction: AFTER}}) {
        pageInfo {
          hasNextPage
          endCursor
        }
        edges {
          cursor
          node {
            id
            title
            cover {
              id
              url
            }
            isOther
            htmlContent
            doc {
              id
              title
            }
          }
        }
      }
    }
  }
}
";

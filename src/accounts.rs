use crate::client::Client;
use crate::error::Form3Error;
use crate::models::{Account, DataRequest, DataResponse, Links, NewAccount, NewAccountAttributes};
use log::{debug, info};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::form_urlencoded;

const ACCOUNTS_PATH: &str = "organisation/accounts";
const ACCOUNT_TYPE: &str = "accounts";
/// Everything but RFC 3986 unreserved characters is escaped inside an id.
const ID_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Paging for [`AccountService::list`]. Unset fields are left to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
}

impl ListOptions {
    fn query(&self) -> Option<String> {
        if self.page_number.is_none() && self.page_size.is_none() {
            return None;
        }
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(number) = self.page_number {
            query.append_pair("page[number]", &number.to_string());
        }
        if let Some(size) = self.page_size {
            query.append_pair("page[size]", &size.to_string());
        }
        Some(query.finish())
    }
}

/// Account endpoints, obtained through [`Client::accounts`].
#[derive(Debug, Clone, Copy)]
pub struct AccountService<'a> {
    client: &'a Client,
}

impl<'a> AccountService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a new account.
    pub async fn create(
        &self,
        id: &str,
        organisation_id: &str,
        attributes: NewAccountAttributes,
    ) -> Result<DataResponse<Account>, Form3Error> {
        require_id(id)?;
        let request = DataRequest {
            data: NewAccount {
                id: id.to_string(),
                organisation_id: organisation_id.to_string(),
                resource_type: ACCOUNT_TYPE.to_string(),
                attributes: Some(attributes),
            },
        };
        info!("Creating account {} for organisation {}", id, organisation_id);
        self.client
            .post(ACCOUNTS_PATH, &request)
            .await?
            .ok_or(Form3Error::InvalidResponse)
    }

    /// Fetch a single account by id.
    pub async fn fetch(&self, id: &str) -> Result<DataResponse<Account>, Form3Error> {
        let uri = account_path(id)?;
        debug!("Fetching account {}", id);
        self.client
            .get(&uri)
            .await?
            .ok_or(Form3Error::InvalidResponse)
    }

    /// Delete an account. `version` must match the server's current version,
    /// otherwise the API answers 409.
    pub async fn delete(&self, id: &str, version: u64) -> Result<(), Form3Error> {
        let uri = format!("{}?version={version}", account_path(id)?);
        info!("Deleting account {} at version {}", id, version);
        self.client.delete(&uri).await
    }

    /// List accounts, one page at a time.
    pub async fn list(
        &self,
        options: ListOptions,
    ) -> Result<DataResponse<Vec<Account>>, Form3Error> {
        let uri = match options.query() {
            Some(query) => format!("{ACCOUNTS_PATH}?{query}"),
            None => ACCOUNTS_PATH.to_string(),
        };
        debug!("Listing accounts with {:?}", options);
        self.client
            .get(&uri)
            .await?
            .ok_or(Form3Error::InvalidResponse)
    }

    /// Follow the `next` link of a previous listing. Returns `None` on the
    /// last page.
    pub async fn next_page(
        &self,
        links: &Links,
    ) -> Result<Option<DataResponse<Vec<Account>>>, Form3Error> {
        let Some(next) = links.next.as_deref() else {
            return Ok(None);
        };
        debug!("Following next page link {}", next);
        self.client
            .get(next)
            .await?
            .ok_or(Form3Error::InvalidResponse)
            .map(Some)
    }
}

fn require_id(id: &str) -> Result<(), Form3Error> {
    if id.trim().is_empty() {
        return Err(Form3Error::InvalidParameter("account id must not be empty"));
    }
    Ok(())
}

/// Path of a single account, with `id` escaped as one path segment.
fn account_path(id: &str) -> Result<String, Form3Error> {
    require_id(id)?;
    if id == "." || id == ".." {
        return Err(Form3Error::InvalidParameter(
            "account id must not be a dot segment",
        ));
    }
    Ok(format!(
        "{ACCOUNTS_PATH}/{}",
        utf8_percent_encode(id, ID_ENCODE_SET)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_options_build_page_query() {
        assert_eq!(ListOptions::default().query(), None);
        let options = ListOptions {
            page_number: Some(2),
            page_size: Some(50),
        };
        assert_eq!(
            options.query().as_deref(),
            Some("page%5Bnumber%5D=2&page%5Bsize%5D=50")
        );
        let size_only = ListOptions {
            page_size: Some(10),
            ..Default::default()
        };
        assert_eq!(size_only.query().as_deref(), Some("page%5Bsize%5D=10"));
    }

    #[test]
    fn ids_are_escaped_as_one_segment() {
        assert_eq!(
            account_path("ad27e265-9605-4b4b-a0e5-3003ea9cc4dc").unwrap(),
            "organisation/accounts/ad27e265-9605-4b4b-a0e5-3003ea9cc4dc"
        );
        assert_eq!(
            account_path("abc#").unwrap(),
            "organisation/accounts/abc%23"
        );
        assert_eq!(
            account_path("../../x").unwrap(),
            "organisation/accounts/..%2F..%2Fx"
        );
        assert_eq!(
            account_path("a?b%c").unwrap(),
            "organisation/accounts/a%3Fb%25c"
        );
        for id in [".", ".."] {
            assert!(matches!(
                account_path(id),
                Err(Form3Error::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn escaped_ids_resolve_under_the_collection() {
        let client = Client::with_http_client(reqwest::Client::new()).unwrap();
        let delete = format!("{}?version=3", account_path("abc#").unwrap());
        assert_eq!(
            client.resolve(&delete).unwrap().as_str(),
            "https://api.form3.tech/v1/organisation/accounts/abc%23?version=3"
        );
        assert_eq!(
            client
                .resolve(&account_path("../../x").unwrap())
                .unwrap()
                .as_str(),
            "https://api.form3.tech/v1/organisation/accounts/..%2F..%2Fx"
        );
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(matches!(
            require_id(""),
            Err(Form3Error::InvalidParameter(_))
        ));
        assert!(matches!(
            require_id("  "),
            Err(Form3Error::InvalidParameter(_))
        ));
        assert!(require_id("ad27e265-9605-4b4b-a0e5-3003ea9cc4dc").is_ok());
    }
}

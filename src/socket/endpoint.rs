use crate::domain_model::UserId;
use url::Url;

/// Builds the push endpoint URL, keying the session by user when one is known.
pub fn socket_url(base: &str, user_id: Option<UserId>) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    if let Some(user_id) = user_id {
        url.query_pairs_mut()
            .append_pair("user_id", &user_id.to_string());
    }
    Ok(url.into())
}

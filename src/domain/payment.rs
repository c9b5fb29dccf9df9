use super::account::AccountId;
use super::memo::MandatedMemo;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An untrusted payment submission, exactly as received in the form body.
///
/// Missing form fields deserialize to empty strings; the accessors below turn
/// empty values into `None` so that "absent" and "empty" are treated alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentRequest {
    pub source: String,
    pub destination: String,
    pub amount: String,
    pub asset_code: String,
    pub asset_issuer: String,
    pub memo_type: String,
    pub memo: String,
    pub extra_memo: String,
    pub sender: String,
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

impl PaymentRequest {
    /// Builds a request from raw form pairs. The first value of a repeated
    /// field wins and unknown fields are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut request = Self::default();
        let mut seen = HashSet::new();
        for (key, value) in pairs {
            let field = match key.as_str() {
                "source" => &mut request.source,
                "destination" => &mut request.destination,
                "amount" => &mut request.amount,
                "asset_code" => &mut request.asset_code,
                "asset_issuer" => &mut request.asset_issuer,
                "memo_type" => &mut request.memo_type,
                "memo" => &mut request.memo,
                "extra_memo" => &mut request.extra_memo,
                "sender" => &mut request.sender,
                _ => continue,
            };
            if seen.insert(key) {
                *field = value;
            }
        }
        request
    }

    pub fn asset_code(&self) -> Option<&str> {
        non_empty(&self.asset_code)
    }

    pub fn asset_issuer(&self) -> Option<&str> {
        non_empty(&self.asset_issuer)
    }

    pub fn memo_type(&self) -> Option<&str> {
        non_empty(&self.memo_type)
    }

    pub fn memo(&self) -> Option<&str> {
        non_empty(&self.memo)
    }

    pub fn extra_memo(&self) -> Option<&str> {
        non_empty(&self.extra_memo)
    }
}

/// Output of address resolution: a validated account plus any memo the
/// destination insists on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub account_id: AccountId,
    pub mandated_memo: Option<MandatedMemo>,
}

/// Fields forwarded to the compliance service when the relay path is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceSend {
    pub source: String,
    pub sender: String,
    pub destination: String,
    pub amount: String,
    pub asset_code: String,
    pub asset_issuer: String,
    pub extra_memo: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_are_absent() {
        let request = PaymentRequest {
            asset_code: "USD".to_string(),
            ..Default::default()
        };
        assert_eq!(request.asset_code(), Some("USD"));
        assert_eq!(request.asset_issuer(), None);
        assert_eq!(request.memo(), None);
        assert_eq!(request.extra_memo(), None);
    }

    #[test]
    fn test_first_form_value_wins() {
        let pairs = [
            ("source", "SFIRST"),
            ("amount", "1"),
            ("source", "SSECOND"),
            ("unknown", "x"),
            ("amount", "2"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));

        let request = PaymentRequest::from_pairs(pairs);
        assert_eq!(request.source, "SFIRST");
        assert_eq!(request.amount, "1");
        assert_eq!(request.destination, "");
    }

    #[test]
    fn test_missing_form_fields_default_to_empty() {
        let request: PaymentRequest =
            serde_json::from_str(r#"{"source": "S", "amount": "1"}"#).unwrap();
        assert_eq!(request.source, "S");
        assert_eq!(request.destination, "");
        assert_eq!(request.memo_type(), None);
    }
}

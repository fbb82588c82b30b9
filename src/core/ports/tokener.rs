use crate::error::Error;
use serde::{Deserialize, Serialize};

pub trait Payload: Serialize + for<'d> Deserialize<'d> {
    fn user(&self) -> &str;
}

pub trait Tokener<P: Payload> {
    fn gen_token(&self, payload: &P) -> Result<String, Error>;
    fn verify_token(&self, token: &str) -> Result<P, Error>;

    /// Verifies the value of an `Authorization` header. The `Bearer ` scheme
    /// prefix is optional.
    fn verify_header(&self, header: &str) -> Result<P, Error> {
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(Error::Unauthorized);
        }
        self.verify_token(token)
    }
}

pub mod access_token;

pub use access_token::{
    mint_client_assertion, AccessTokenClaims, AccessTokenError, AccessTokenIssuer,
    AccessTokenRequest, AccessTokenResponse, JwtRequestAccessTokenValidator,
    RequestAccessTokenValidationResult, RequestAccessTokenValidator,
    CLIENT_ASSERTION_TYPE_JWT_BEARER, GRANT_TYPE_CLIENT_CREDENTIALS,
};

/// Estate credential primitives.
///
/// - `password`: Argon2id hashing for user and admin passwords
/// - `token`: HS256 session tokens bound to a server-side session row
pub mod password;
pub mod token;

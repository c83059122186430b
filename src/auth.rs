use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use axum::{
    async_trait,
    extract::{FromRequestParts, Json},
    http::{header, request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

pub const COOKIE_NAME: &str = "mk_token";
const SESSION_HOURS: i64 = 12;

/// Rol resuelto una sola vez al loguear y transportado tipado en el token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Cajero,
    Encargado,
    Admin,
    Superadmin,
}

impl Rol {
    /// Mapea el nombre de rol guardado en la tabla `roles`.
    pub fn parse(nombre: &str) -> Option<Rol> {
        match nombre.to_lowercase().as_str() {
            "cajero" => Some(Rol::Cajero),
            "encargado" => Some(Rol::Encargado),
            "admin" | "dueno" => Some(Rol::Admin),
            "superadmin" => Some(Rol::Superadmin),
            _ => None,
        }
    }

    /// Admin y superadmin ven datos de todas las sedes y administran usuarios.
    pub fn es_admin(&self) -> bool {
        matches!(self, Rol::Admin | Rol::Superadmin)
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rol::Cajero => "cajero",
            Rol::Encargado => "encargado",
            Rol::Admin => "admin",
            Rol::Superadmin => "superadmin",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// id_usuario
    pub sub: i32,
    pub username: String,
    pub rol: Rol,
    pub id_sede: i32,
    pub exp: usize,
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    // Cookie de sesión (la UI) o Authorization: Bearer (clientes de API)
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(COOKIE_NAME) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "No autorizado" })),
        ))?;

        decode_jwt(&token).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Token inválido o expirado" })),
            )
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn get_jwt_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "secret".to_string()
        } else {
            panic!("JWT_SECRET environment variable must be set in production");
        }
    })
}

pub fn create_jwt(id_usuario: i32, username: &str, rol: Rol, id_sede: i32) -> Result<String, String> {
    let secret = get_jwt_secret();
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(SESSION_HOURS))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: id_usuario,
        username: username.to_owned(),
        rol,
        id_sede,
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(token: &str) -> Result<Claims, String> {
    let secret = get_jwt_secret();
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Set-Cookie para la sesión (HTTP-only, 12 horas).
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        COOKIE_NAME,
        token,
        SESSION_HOURS * 3600
    )
}

/// Set-Cookie que borra la sesión.
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", COOKIE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rol_acepta_alias_historicos() {
        assert_eq!(Rol::parse("Admin"), Some(Rol::Admin));
        assert_eq!(Rol::parse("dueno"), Some(Rol::Admin));
        assert_eq!(Rol::parse("CAJERO"), Some(Rol::Cajero));
        assert_eq!(Rol::parse("repositor"), None);
    }

    fn parts_con(headers: &[(axum::http::HeaderName, &str)]) -> Parts {
        let mut builder = axum::http::Request::builder();
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extrae_token_de_cookie_entre_varias() {
        let parts = parts_con(&[(
            header::COOKIE,
            "otra=abc; mk_token=tok123; ultima=\"x y\"",
        )]);
        assert_eq!(token_from_parts(&parts).as_deref(), Some("tok123"));
    }

    #[test]
    fn sin_cookie_cae_al_bearer() {
        let parts = parts_con(&[(header::AUTHORIZATION, "Bearer tok456")]);
        assert_eq!(token_from_parts(&parts).as_deref(), Some("tok456"));

        let vacias = parts_con(&[]);
        assert_eq!(token_from_parts(&vacias), None);
    }

    #[test]
    fn jwt_roundtrip() {
        let token = create_jwt(7, "cajero1", Rol::Cajero, 2).unwrap();
        let claims = decode_jwt(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "cajero1");
        assert_eq!(claims.rol, Rol::Cajero);
        assert_eq!(claims.id_sede, 2);
    }
}

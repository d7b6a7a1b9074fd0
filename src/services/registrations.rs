use tracing::{info, warn};

use crate::{
    db::{ApprovalCommit, RegistrationStore, Store, StoreError, UserStore},
    error::AppError,
    models::{
        registration::{
            ApprovedRegistration, NewRegistration, PendingRegistration, RegistrationStatus,
            SubmitRegistrationRequest,
        },
        user::NewUser,
    },
    services::{metrics, password::PasswordHasher},
};

const ROLE_PREFIX: &str = "ROLE_";

/// Splits on the first whitespace run. Everything after it is kept verbatim
/// as the last name, internal spaces included.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// `"pastor"` → `"ROLE_PASTOR"`. An already-prefixed role is not prefixed twice.
pub fn granted_role(approved_role: &str) -> String {
    let role = approved_role.trim().to_uppercase();
    if role.starts_with(ROLE_PREFIX) {
        role
    } else {
        format!("{ROLE_PREFIX}{role}")
    }
}

pub(crate) fn normalize_login(login: &str) -> String {
    login.trim().to_lowercase()
}

pub(crate) fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= 50
        && login
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_.@-".contains(c))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims, drops blanks and duplicates, keeps the caller's order.
fn normalize_modules(modules: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(modules.len());
    for m in modules {
        let m = m.trim().to_string();
        if !m.is_empty() && !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

fn user_from_registration(
    registration: &PendingRegistration,
    granted_role: &str,
    modules: Vec<String>,
) -> NewUser {
    let (first_name, last_name) = split_full_name(&registration.full_name);
    NewUser {
        login: Some(normalize_login(&registration.login)),
        email: Some(registration.email.trim().to_lowercase()),
        first_name,
        last_name,
        password_hash: Some(registration.password_hash.clone()),
        activated: true,
        is_dependent: false,
        father_id: None,
        mother_id: None,
        birth_date: registration.birth_date,
        authorities: vec![granted_role.to_string()],
        modules,
        phone: registration.phone.clone(),
        secondary_phone: registration.secondary_phone.clone(),
        emergency_contact: registration.emergency_contact.clone(),
        document_id: registration.document_id.clone(),
        sex: registration.sex.clone(),
        address: registration
            .address
            .as_ref()
            .map(|a| a.fields.clone())
            .unwrap_or_default(),
    }
}

/// A commit can still lose a race on login/e-mail after the pre-check;
/// the store's unique rule then surfaces as `AlreadyUsed`.
fn approval_failed(registration_id: i64, e: StoreError) -> AppError {
    let err = AppError::from(e);
    let outcome = match err {
        AppError::AlreadyUsed { .. } => "already_used",
        AppError::NotFound(_) => "not_found",
        _ => "error",
    };
    metrics::REGISTRATIONS_APPROVED_COUNTER
        .with_label_values(&[outcome])
        .inc();
    warn!("Registration {registration_id} approval failed: {err}");
    err
}

pub struct RegistrationService;

impl RegistrationService {
    /// Public self-registration: validates and queues the request for review.
    pub async fn submit(
        store: &dyn Store,
        hasher: &PasswordHasher,
        req: SubmitRegistrationRequest,
    ) -> Result<PendingRegistration, AppError> {
        if req.full_name.trim().is_empty() {
            return Err(AppError::validation("O nome completo é obrigatório"));
        }
        if req.birth_date.is_none() {
            return Err(AppError::validation("A data de nascimento é obrigatória"));
        }
        let login = normalize_login(&req.login);
        if !is_valid_login(&login) {
            return Err(AppError::validation("Login inválido"));
        }
        let email = req.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AppError::validation("E-mail inválido"));
        }
        let password_len = req.password.chars().count();
        if !(4..=100).contains(&password_len) {
            return Err(AppError::validation(
                "A senha deve ter entre 4 e 100 caracteres",
            ));
        }

        if store.login_in_use(&login).await? {
            return Err(AppError::already_used("login"));
        }
        if store.email_in_use(&email).await? {
            return Err(AppError::already_used("email"));
        }

        let password_hash = hasher.hash(&req.password)?;

        let registration = store
            .insert_registration(NewRegistration {
                full_name: req.full_name.trim().to_string(),
                email,
                phone: non_blank(req.phone),
                secondary_phone: non_blank(req.secondary_phone),
                emergency_contact: non_blank(req.emergency_contact),
                document_id: non_blank(req.document_id),
                sex: non_blank(req.sex),
                birth_date: req.birth_date,
                login,
                password_hash,
                requested_role: non_blank(req.requested_role),
                notes: non_blank(req.notes),
                address: req.address,
            })
            .await?;

        metrics::REGISTRATIONS_SUBMITTED_COUNTER.inc();
        info!(
            "Registration {} queued for login '{}'",
            registration.id, registration.login
        );
        Ok(registration)
    }

    pub async fn list(
        store: &dyn Store,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<PendingRegistration>, AppError> {
        Ok(store.list_registrations(status).await?)
    }

    /// Converts a queued registration into an activated user and consumes it.
    ///
    /// The status flip, user creation and deletion of the registration and
    /// its address are committed together; a login/e-mail collision leaves
    /// the registration untouched and awaiting review.
    pub async fn approve(
        store: &dyn Store,
        registration_id: i64,
        approved_role: &str,
        modules: Vec<String>,
    ) -> Result<ApprovedRegistration, AppError> {
        let registration = store
            .find_registration(registration_id)
            .await?
            .ok_or(AppError::NotFound("Cadastro"))?;

        let approved_role = approved_role.trim();
        if approved_role.is_empty() {
            return Err(AppError::validation("O papel aprovado é obrigatório"));
        }

        let granted = granted_role(approved_role);
        let modules = normalize_modules(modules);
        let user = user_from_registration(&registration, &granted, modules.clone());

        for (field, in_use) in [
            ("login", store.login_in_use(user.login.as_deref().unwrap_or_default()).await?),
            ("email", store.email_in_use(user.email.as_deref().unwrap_or_default()).await?),
        ] {
            if in_use {
                metrics::REGISTRATIONS_APPROVED_COUNTER
                    .with_label_values(&["already_used"])
                    .inc();
                warn!("Registration {registration_id} not approved: {field} already in use");
                return Err(AppError::already_used(field));
            }
        }

        let commit = ApprovalCommit {
            registration_id,
            approved_role: approved_role.to_string(),
            address_id: registration.address.as_ref().map(|a| a.id),
            user,
        };

        let user = store
            .commit_approval(commit)
            .await
            .map_err(|e| approval_failed(registration_id, e))?;

        metrics::REGISTRATIONS_APPROVED_COUNTER
            .with_label_values(&["ok"])
            .inc();
        info!(
            "Registration {} approved as {} → user {}",
            registration_id, granted, user.id
        );

        Ok(ApprovedRegistration {
            registration_id,
            status: RegistrationStatus::Approved,
            approved_role: approved_role.to_string(),
            granted_role: granted,
            modules,
            user: user.into(),
        })
    }
}

use tracing::info;

use crate::{
    db::{Store, UserStore},
    error::AppError,
    models::user::{CreateUserRequest, NewUser, User},
    services::{
        password::PasswordHasher,
        registrations::{is_valid_login, non_blank, normalize_login},
    },
};

const DEFAULT_AUTHORITY: &str = "ROLE_USER";

pub enum AvatarContent {
    Blob { data: Vec<u8>, content_type: String },
    /// Pre-blob avatars kept on disk; served from the media directory.
    LegacyPath(String),
}

pub struct UserService;

impl UserService {
    /// Administrative creation of a member or a dependent.
    ///
    /// Dependents carry no login and must point at one or two parents, none of
    /// which may itself be a dependent. This keeps the parent relation one
    /// level deep and acyclic without any recursive walk.
    pub async fn create(
        store: &dyn Store,
        hasher: &PasswordHasher,
        req: CreateUserRequest,
    ) -> Result<User, AppError> {
        let first_name = req.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err(AppError::validation("O nome é obrigatório"));
        }

        let email = non_blank(req.email).map(|e| e.to_lowercase());
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(AppError::validation("E-mail inválido"));
            }
            if store.email_in_use(email).await? {
                return Err(AppError::already_used("email"));
            }
        }

        let mut new = NewUser {
            email,
            first_name,
            last_name: req.last_name.trim().to_string(),
            birth_date: req.birth_date,
            modules: req.modules,
            phone: non_blank(req.phone),
            address: req.address,
            ..NewUser::default()
        };

        if req.is_dependent {
            if non_blank(req.login).is_some() || req.password.is_some() {
                return Err(AppError::validation("Dependentes não possuem login"));
            }
            let parents: Vec<i64> = [req.father_id, req.mother_id].into_iter().flatten().collect();
            if parents.is_empty() {
                return Err(AppError::validation(
                    "Informe o pai ou a mãe do dependente",
                ));
            }
            if req.father_id.is_some() && req.father_id == req.mother_id {
                return Err(AppError::validation("Pai e mãe devem ser pessoas diferentes"));
            }
            for parent_id in parents {
                let parent = store
                    .find_user(parent_id)
                    .await?
                    .ok_or(AppError::NotFound("Responsável"))?;
                if parent.is_dependent {
                    return Err(AppError::validation(
                        "Um dependente não pode ter dependentes",
                    ));
                }
            }
            new.is_dependent = true;
            new.father_id = req.father_id;
            new.mother_id = req.mother_id;
            new.activated = true;
        } else {
            if req.father_id.is_some() || req.mother_id.is_some() {
                return Err(AppError::validation(
                    "Apenas dependentes podem ter pai ou mãe vinculados",
                ));
            }
            let login = normalize_login(req.login.as_deref().unwrap_or_default());
            if !is_valid_login(&login) {
                return Err(AppError::validation("Login inválido"));
            }
            let password = req.password.unwrap_or_default();
            if !(4..=100).contains(&password.chars().count()) {
                return Err(AppError::validation(
                    "A senha deve ter entre 4 e 100 caracteres",
                ));
            }
            if store.login_in_use(&login).await? {
                return Err(AppError::already_used("login"));
            }
            new.login = Some(login);
            new.password_hash = Some(hasher.hash(&password)?);
            new.activated = req.activated.unwrap_or(true);
            new.authorities = if req.authorities.is_empty() {
                vec![DEFAULT_AUTHORITY.to_string()]
            } else {
                req.authorities
            };
        }

        let user = store.insert_user(new).await?;
        info!(
            "User {} created ({})",
            user.id,
            if user.is_dependent { "dependent" } else { "member" }
        );
        Ok(user)
    }

    pub async fn avatar(store: &dyn Store, user_id: i64) -> Result<AvatarContent, AppError> {
        let avatar = store
            .user_avatar(user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        match (avatar.data, avatar.path) {
            (Some(data), _) => Ok(AvatarContent::Blob {
                data,
                content_type: avatar
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            }),
            (None, Some(path)) if !path.trim().is_empty() => Ok(AvatarContent::LegacyPath(path)),
            _ => Err(AppError::NotFound("Avatar")),
        }
    }
}

/// bcrypt wrapper; the cost comes from `BCRYPT_COST`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        Ok(bcrypt::hash(plain, self.cost)?)
    }
}

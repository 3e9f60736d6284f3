//! Application operations behind the HTTP routes.
//!
//! Every group-scoped operation first checks that the caller belongs to the
//! group; a non-member sees the same "Group not found" as for a missing group.

use crate::auth::{hash_password, verify_password, TokenKeys};
use crate::balance::{self, Balance};
use crate::error::{LedgerError, Result};
use crate::schemas::{
    new_id, AccessToken, Expense, ExpenseDraft, Group, NewExpense, RegisterUser, UpdateUser, User,
    UserGroupBalance, UserProfile,
};
use crate::settlement::{self, Transaction};
use crate::store::{MemoryRepository, Repository};
use std::sync::Arc;
use tracing::info;

pub struct LedgerService {
    users: Arc<dyn Repository<User>>,
    groups: Arc<dyn Repository<Group>>,
    expenses: Arc<dyn Repository<Expense>>,
    tokens: TokenKeys,
}

impl LedgerService {
    pub fn new(
        users: Arc<dyn Repository<User>>,
        groups: Arc<dyn Repository<Group>>,
        expenses: Arc<dyn Repository<Expense>>,
        tokens: TokenKeys,
    ) -> Self {
        LedgerService {
            users,
            groups,
            expenses,
            tokens,
        }
    }

    pub fn in_memory(tokens: TokenKeys) -> Self {
        Self::new(
            Arc::new(MemoryRepository::<User>::new()),
            Arc::new(MemoryRepository::<Group>::new()),
            Arc::new(MemoryRepository::<Expense>::new()),
            tokens,
        )
    }

    pub fn tokens(&self) -> &TokenKeys {
        &self.tokens
    }

    // Users

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.users.get(username).await?.is_some())
    }

    pub async fn register(&self, request: RegisterUser) -> Result<UserProfile> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(LedgerError::Validation(
                "username and password must not be empty".to_string(),
            ));
        }
        if self.user_exists(&request.username).await? {
            return Err(LedgerError::Duplicate("Username already registered".to_string()));
        }
        let user = User {
            username: request.username,
            email: request.email,
            password_hash: hash_password(&request.password)?,
        };
        self.users.put(&user.username, &user).await?;
        info!(username = %user.username, "registered user");
        Ok(UserProfile::from(&user))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        let user = self.users.get(username).await?;
        let user = match user {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                return Err(LedgerError::Unauthorized(
                    "Incorrect username or password".to_string(),
                ))
            }
        };
        Ok(AccessToken {
            access_token: self.tokens.issue(&user.username)?,
            token_type: "bearer".to_string(),
        })
    }

    pub async fn profile(&self, username: &str) -> Result<UserProfile> {
        let user = self.load_user(username).await?;
        Ok(UserProfile::from(&user))
    }

    pub async fn update_profile(&self, username: &str, update: UpdateUser) -> Result<UserProfile> {
        let mut user = self.load_user(username).await?;
        if let Some(email) = update.email.filter(|e| !e.is_empty()) {
            user.email = email;
        }
        if let Some(password) = update.password.filter(|p| !p.is_empty()) {
            user.password_hash = hash_password(&password)?;
        }
        self.users.put(username, &user).await?;
        Ok(UserProfile::from(&user))
    }

    pub async fn delete_user(&self, username: &str) -> Result<()> {
        if !self.users.delete(username).await? {
            return Err(LedgerError::user_not_found(username));
        }
        info!(%username, "deleted user");
        Ok(())
    }

    async fn load_user(&self, username: &str) -> Result<User> {
        self.users
            .get(username)
            .await?
            .ok_or_else(|| LedgerError::user_not_found(username))
    }

    // Groups

    pub async fn create_group(&self, caller: &str, name: String) -> Result<Group> {
        let group = Group::new(name, caller.to_string())?;
        self.groups.put(&group.id, &group).await?;
        info!(group_id = %group.id, creator = %caller, "created group");
        Ok(group)
    }

    pub async fn list_groups(&self, caller: &str) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .groups
            .scan()
            .await?
            .into_iter()
            .filter(|g| g.is_member(caller))
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    /// Loads a group the caller belongs to.
    pub async fn get_group(&self, caller: &str, group_id: &str) -> Result<Group> {
        match self.groups.get(group_id).await? {
            Some(group) if group.is_member(caller) => Ok(group),
            _ => Err(LedgerError::group_not_found(group_id)),
        }
    }

    pub async fn rename_group(&self, caller: &str, group_id: &str, name: String) -> Result<Group> {
        let mut group = self.get_group(caller, group_id).await?;
        if name.trim().is_empty() {
            return Err(LedgerError::Validation("group name must not be empty".to_string()));
        }
        group.name = name;
        self.groups.put(&group.id, &group).await?;
        Ok(group)
    }

    /// Deletes the group together with its expenses.
    pub async fn delete_group(&self, caller: &str, group_id: &str) -> Result<()> {
        let group = self.get_group(caller, group_id).await?;
        for expense in self.group_expenses(&group).await? {
            self.expenses.delete(&expense.id).await?;
        }
        self.groups.delete(&group.id).await?;
        info!(%group_id, "deleted group");
        Ok(())
    }

    pub async fn add_member(&self, caller: &str, group_id: &str, username: &str) -> Result<Group> {
        let mut group = self.get_group(caller, group_id).await?;
        if group.is_member(username) {
            return Err(LedgerError::Validation("User already in group".to_string()));
        }
        if !self.user_exists(username).await? {
            return Err(LedgerError::user_not_found(username));
        }
        group.members.insert(username.to_string());
        self.groups.put(&group.id, &group).await?;
        info!(%group_id, member = %username, "added member");
        Ok(group)
    }

    pub async fn remove_member(&self, caller: &str, group_id: &str, username: &str) -> Result<Group> {
        let mut group = self.get_group(caller, group_id).await?;
        if !group.is_member(username) {
            return Err(LedgerError::Validation("User not in group".to_string()));
        }
        if group.members.len() == 1 {
            return Err(LedgerError::Validation(
                "cannot remove the last member of a group".to_string(),
            ));
        }
        group.members.remove(username);
        self.groups.put(&group.id, &group).await?;
        info!(%group_id, member = %username, "removed member");
        Ok(group)
    }

    // Expenses

    pub async fn create_expense(&self, caller: &str, request: NewExpense) -> Result<Expense> {
        let group = self.get_group(caller, &request.group_id).await?;
        let expense = Expense::new(new_id(), &group, request.expense)?;
        self.expenses.put(&expense.id, &expense).await?;
        info!(
            expense_id = %expense.id,
            group_id = %group.id,
            amount = %expense.amount,
            split_type = %expense.split_type,
            "created expense"
        );
        Ok(expense)
    }

    pub async fn list_expenses(&self, caller: &str, group_id: &str) -> Result<Vec<Expense>> {
        let group = self.get_group(caller, group_id).await?;
        self.group_expenses(&group).await
    }

    pub async fn get_expense(&self, caller: &str, group_id: &str, expense_id: &str) -> Result<Expense> {
        self.get_group(caller, group_id).await?;
        match self.expenses.get(expense_id).await? {
            Some(expense) if expense.group_id == group_id => Ok(expense),
            _ => Err(LedgerError::expense_not_found(expense_id)),
        }
    }

    /// Replaces the whole expense; the split is validated again against the
    /// group's current members.
    pub async fn update_expense(
        &self,
        caller: &str,
        group_id: &str,
        expense_id: &str,
        draft: ExpenseDraft,
    ) -> Result<Expense> {
        let existing = self.get_expense(caller, group_id, expense_id).await?;
        let group = self.get_group(caller, group_id).await?;
        let expense = Expense::new(existing.id, &group, draft)?;
        self.expenses.put(&expense.id, &expense).await?;
        info!(%expense_id, %group_id, "updated expense");
        Ok(expense)
    }

    pub async fn delete_expense(&self, caller: &str, group_id: &str, expense_id: &str) -> Result<()> {
        let expense = self.get_expense(caller, group_id, expense_id).await?;
        self.expenses.delete(&expense.id).await?;
        info!(%expense_id, %group_id, "deleted expense");
        Ok(())
    }

    pub async fn group_balances(&self, caller: &str, group_id: &str) -> Result<Balance> {
        let group = self.get_group(caller, group_id).await?;
        let expenses = self.group_expenses(&group).await?;
        Ok(balance::aggregate(&group.members, &expenses))
    }

    pub async fn user_balances(&self, caller: &str) -> Result<Vec<UserGroupBalance>> {
        let groups = self.list_groups(caller).await?;
        let expenses = self.expenses.scan().await?;
        Ok(balance::user_balances(caller, &groups, &expenses))
    }

    pub async fn settle(&self, caller: &str, group_id: &str) -> Result<Vec<Transaction>> {
        let balances = self.group_balances(caller, group_id).await?;
        let transactions = settlement::simplify(&balances);
        info!(%group_id, transactions = transactions.len(), "computed settlement");
        Ok(transactions)
    }

    /// The group's expenses in a stable order (by id).
    async fn group_expenses(&self, group: &Group) -> Result<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .scan()
            .await?
            .into_iter()
            .filter(|e| e.group_id == group.id)
            .collect();
        expenses.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(expenses)
    }
}

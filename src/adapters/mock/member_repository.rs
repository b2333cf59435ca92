use crate::domain::{member::Member, value_objects::MemberId};
use crate::ports::member_repository::{
    MemberRepository as MemberRepositoryTrait, RepositoryError, Result,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory implementation of MemberRepository
///
/// Enforces the same uniqueness rules as the PostgreSQL tables:
/// member_id is a primary key and email is unique.
pub struct MemberRepository {
    members: Mutex<HashMap<MemberId, Member>>,
}

impl MemberRepository {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored members
    pub fn len(&self) -> usize {
        self.members.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemberRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberRepositoryTrait for MemberRepository {
    async fn exists(&self, member_id: MemberId) -> Result<bool> {
        Ok(self.members.lock().unwrap().contains_key(&member_id))
    }

    async fn get_by_id(&self, member_id: MemberId) -> Result<Option<Member>> {
        Ok(self.members.lock().unwrap().get(&member_id).cloned())
    }

    async fn create(&self, member: &Member) -> Result<()> {
        let mut members = self.members.lock().unwrap();
        if members.contains_key(&member.member_id) {
            return Err(RepositoryError::AlreadyExists(member.member_id));
        }
        if member.email.is_some() && members.values().any(|m| m.email == member.email) {
            return Err(RepositoryError::EmailTaken);
        }
        members.insert(member.member_id, member.clone());
        Ok(())
    }

    async fn update(&self, member: &Member) -> Result<bool> {
        let mut members = self.members.lock().unwrap();
        match members.get_mut(&member.member_id) {
            Some(stored) => {
                stored.name = member.name.clone();
                stored.email = member.email.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, member_id: MemberId) -> Result<bool> {
        Ok(self.members.lock().unwrap().remove(&member_id).is_some())
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use fake::{faker::name::en::Name, Fake};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use campus_seating::{
    cache::PlanCache,
    config::{AppConfig, Config, DatabaseConfig, JwtConfig, LogFormat, NotificationConfig, RedisConfig},
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{NewNotification, Notification, PlanStatus, Role, SeatingPlan, Student},
    repository::{NotificationStore, RosterProvider, SeatingRepository},
    services::{notifications::NotificationSink, seating::SeatingService},
    AppState,
};

pub const JWT_SECRET: &str = "test-secret";

/// Хранилище в памяти: планы, список групп и уведомления.
#[derive(Default)]
pub struct MemoryStore {
    plans: Mutex<HashMap<Uuid, SeatingPlan>>,
    sections: Mutex<HashMap<Uuid, Uuid>>,
    students: Mutex<HashMap<Uuid, Vec<Student>>>,
    notifications: Mutex<Vec<Notification>>,
    pub fail_dispatch: AtomicBool,
}

impl MemoryStore {
    pub fn add_section(&self, section: Uuid, department: Uuid, students: Vec<Student>) {
        self.sections.lock().unwrap().insert(section, department);
        self.students.lock().unwrap().insert(section, students);
    }

    pub fn plan(&self, id: Uuid) -> Option<SeatingPlan> {
        self.plans.lock().unwrap().get(&id).cloned()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

fn newest_first(mut plans: Vec<SeatingPlan>) -> Vec<SeatingPlan> {
    plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    plans
}

#[async_trait]
impl SeatingRepository for MemoryStore {
    async fn insert(&self, plan: &SeatingPlan) -> AppResult<()> {
        self.plans.lock().unwrap().insert(plan.id, plan.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<SeatingPlan>> {
        Ok(self.plan(id))
    }

    async fn list_pending_for_department(&self, department: Uuid) -> AppResult<Vec<SeatingPlan>> {
        let sections = self.sections.lock().unwrap().clone();
        let plans = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.status == PlanStatus::Pending)
            .filter(|p| sections.get(&p.section) == Some(&department))
            .cloned()
            .collect();
        Ok(newest_first(plans))
    }

    async fn list_by_faculty(&self, faculty: Uuid) -> AppResult<Vec<SeatingPlan>> {
        let plans = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.faculty == faculty)
            .cloned()
            .collect();
        Ok(newest_first(plans))
    }

    async fn list_approved_for_section(&self, section: Uuid) -> AppResult<Vec<SeatingPlan>> {
        let mut plans: Vec<SeatingPlan> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.section == section && p.status == PlanStatus::Approved)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(plans)
    }

    async fn decide(
        &self,
        id: Uuid,
        status: PlanStatus,
        remarks: Option<String>,
    ) -> AppResult<Option<SeatingPlan>> {
        let mut plans = self.plans.lock().unwrap();
        match plans.get_mut(&id) {
            Some(plan) if plan.status == PlanStatus::Pending => {
                plan.status = status;
                plan.hod_remarks = remarks;
                plan.updated_at = Utc::now();
                Ok(Some(plan.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.plans.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl RosterProvider for MemoryStore {
    async fn list_active_students(&self, section: Uuid) -> AppResult<Vec<Student>> {
        let mut students = self
            .students
            .lock()
            .unwrap()
            .get(&section)
            .cloned()
            .unwrap_or_default();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn section_department(&self, section: Uuid) -> AppResult<Option<Uuid>> {
        Ok(self.sections.lock().unwrap().get(&section).copied())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_many(&self, batch: &[NewNotification]) -> AppResult<usize> {
        if self.fail_dispatch.load(Ordering::SeqCst) {
            return Err(AppError::Internal("notification store unavailable".to_string()));
        }
        let mut stored = self.notifications.lock().unwrap();
        for n in batch {
            stored.push(Notification {
                id: Uuid::new_v4(),
                recipient: n.recipient,
                title: n.title.clone(),
                message: n.message.clone(),
                kind: n.kind.as_str().to_string(),
                link: n.link.clone(),
                is_read: false,
                created_at: Utc::now(),
            });
        }
        Ok(batch.len())
    }

    async fn list_for_recipient(&self, recipient: Uuid, limit: i64) -> AppResult<Vec<Notification>> {
        let mut mine: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit as usize);
        Ok(mine)
    }

    async fn mark_read(&self, id: Uuid, recipient: Uuid) -> AppResult<bool> {
        let mut stored = self.notifications.lock().unwrap();
        match stored.iter_mut().find(|n| n.id == id && n.recipient == recipient) {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Кеш в памяти с теми же ключами поколений, что и Redis.
#[derive(Default)]
pub struct MemoryCache {
    generations: Mutex<HashMap<Uuid, u64>>,
    entries: Mutex<HashMap<(Uuid, u64), Vec<SeatingPlan>>>,
    pub hits: AtomicUsize,
    pub fail: AtomicBool,
}

impl MemoryCache {
    pub fn entry(&self, section: Uuid, generation: u64) -> Option<Vec<SeatingPlan>> {
        self.entries.lock().unwrap().get(&(section, generation)).cloned()
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlanCache for MemoryCache {
    async fn generation(&self, section: Uuid) -> AppResult<u64> {
        self.check()?;
        Ok(self.generations.lock().unwrap().get(&section).copied().unwrap_or(0))
    }

    async fn get_approved(&self, section: Uuid, generation: u64) -> AppResult<Option<Vec<SeatingPlan>>> {
        self.check()?;
        let found = self.entry(section, generation);
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(found)
    }

    async fn put_approved(&self, section: Uuid, generation: u64, plans: &[SeatingPlan]) -> AppResult<()> {
        self.check()?;
        self.entries.lock().unwrap().insert((section, generation), plans.to_vec());
        Ok(())
    }

    async fn invalidate_section(&self, section: Uuid) -> AppResult<()> {
        self.check()?;
        let mut generations = self.generations.lock().unwrap();
        let generation = generations.entry(section).or_insert(0);
        *generation += 1;
        let stale = *generation - 1;
        self.entries.lock().unwrap().remove(&(section, stale));
        Ok(())
    }
}

pub fn students(n: usize) -> Vec<Student> {
    (0..n)
        .map(|i| Student {
            id: Uuid::new_v4(),
            name: Name().fake(),
            enrollment_number: Some(format!("1CS24{:03}", i)),
        })
        .collect()
}

/// Одна кафедра, одна секция, преподаватель и HOD.
pub struct Campus {
    pub store: Arc<MemoryStore>,
    pub department: Uuid,
    pub section: Uuid,
    pub students: Vec<Student>,
    pub faculty: AuthUser,
    pub hod: AuthUser,
}

impl Campus {
    pub fn new(student_count: usize) -> Self {
        let store = Arc::new(MemoryStore::default());
        let department = Uuid::new_v4();
        let section = Uuid::new_v4();
        let students = students(student_count);
        store.add_section(section, department, students.clone());

        Self {
            store,
            department,
            section,
            students,
            faculty: AuthUser {
                user_id: Uuid::new_v4(),
                role: Role::Faculty,
                department: Some(department),
                section: None,
            },
            hod: AuthUser {
                user_id: Uuid::new_v4(),
                role: Role::Hod,
                department: Some(department),
                section: None,
            },
        }
    }

    pub fn service(&self) -> SeatingService {
        self.build_service(None)
    }

    pub fn cached_service(&self, cache: Arc<MemoryCache>) -> SeatingService {
        self.build_service(Some(cache as Arc<dyn PlanCache>))
    }

    fn build_service(&self, cache: Option<Arc<dyn PlanCache>>) -> SeatingService {
        SeatingService::new(
            self.store.clone(),
            self.store.clone(),
            NotificationSink::Enabled(self.store.clone()),
            cache,
            "/my-seating",
        )
    }

    pub fn student_user(&self, student: &Student) -> AuthUser {
        AuthUser {
            user_id: student.id,
            role: Role::Student,
            department: Some(self.department),
            section: Some(self.section),
        }
    }

    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState { config: test_config(), seating: self.service() })
    }
}

pub fn test_config() -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            rust_log: "campus_seating=debug".to_string(),
            log_format: LogFormat::Text,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            pool_size: 1,
        },
        redis: RedisConfig { url: None, plan_ttl_seconds: 60 },
        jwt: JwtConfig { secret: JWT_SECRET.to_string() },
        notifications: NotificationConfig {
            enabled: true,
            link: "/my-seating".to_string(),
        },
    }
}

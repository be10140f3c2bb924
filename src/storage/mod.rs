//! 存储模块
//!
//! 持久化协作方的抽象与后端实现。管道只依赖 [`ChatRepository`]
//! trait，后端由工厂按配置构造并显式传入，不使用进程级单例。

pub mod factory;
pub mod memstore;
pub mod redb_store;
pub mod repository;

pub use factory::create_repository;
pub use memstore::InMemoryRepository;
pub use redb_store::RedbRepository;
pub use repository::ChatRepository;

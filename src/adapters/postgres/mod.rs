pub mod member_repository;

// パブリックに型を再エクスポート
pub use member_repository::MemberRepository as PostgresMemberRepository;

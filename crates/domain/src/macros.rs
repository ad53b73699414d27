/// `i64` ベースの ID 型を定義する宣言型マクロ
///
/// ID はデータベースの BIGSERIAL で採番されるため、アプリケーション側では
/// 生成せず、既存の値から復元するだけとする。
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`i64` をラップ）
/// - `derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: 既存の値から ID を作成
/// - `as_i64()`: 内部の値を取得
///
/// # 使用例
///
/// ```rust
/// use courier_domain::message::MessageId;
///
/// let id = MessageId::new(42);
/// assert_eq!(id.as_i64(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        $vis struct $Name(i64);

        impl $Name {
            /// 既存の値から ID を作成する
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// 内部の値を取得する
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }
    };
}

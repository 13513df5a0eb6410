use crate::errors::RemovalError;

/// 背景除去処理の抽象化
///
/// エンコード済みの画像バイト列を受け取り、背景を透過させた出力形式のバイト列を返す。
/// バッチ処理はこのトレイトにのみ依存するので、テストではONNXモデルをモックに差し替えられる
pub trait BackgroundRemover: Send + Sync {
    fn remove(&self, image: &[u8]) -> Result<Vec<u8>, RemovalError>;
}

impl<F> BackgroundRemover for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, RemovalError> + Send + Sync,
{
    fn remove(&self, image: &[u8]) -> Result<Vec<u8>, RemovalError> {
        self(image)
    }
}

// record
/// Build a [`Record`](crate::db::record::Record) from `field => value` pairs.
///
/// `record! { "nome" => "Mesa 1", "numero" => 1 }`
#[macro_export]
macro_rules! record {
    () => {
        $crate::db::record::Record::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {
        $crate::db::record::Record::new()$(.with($field, $value))+
    };
}

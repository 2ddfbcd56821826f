use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// 字符串或数字统一反序列化为字符串（支持 null 值）
pub fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "期望字符串或数字，实际为: {}",
                other
            )))
        }
    })
}

/// 按后端返回顺序反序列化 JSON 对象为有序列表
///
/// 表的先后顺序决定默认选中的表，不能用会重新排序的 map。
pub fn deserialize_ordered_map<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("JSON 对象或 null")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_map(self)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((k, v)) = map.next_entry::<String, T>()? {
                entries.push((k, v));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_option(OrderedVisitor(PhantomData))
}

/// 结果行导出为 CSV
///
/// 表头取第一行的列名；单元格为值的 JSON 编码（数字原样，字符串带引号），
/// 缺失的列留空。没有数据时返回 `None`。
pub fn rows_to_csv(rows: &[Value]) -> Option<String> {
    let first = rows.first()?.as_object()?;
    let headers: Vec<&String> = first.keys().collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        let line = headers
            .iter()
            .map(|h| {
                row.get(h.as_str())
                    .map(|v| serde_json::to_string(v).unwrap_or_default())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    Some(lines.join("\n"))
}

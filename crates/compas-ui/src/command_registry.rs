//! 命令注册表
//!
//! 命令行输入的命令名/快捷键 → 构造方式，支持别名和 Tab 补全

use compas_core::construct::ConstructionMethod;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CommandRegistry {
    /// 完整命令 -> 构造方式
    main_commands: HashMap<String, ConstructionMethod>,
    /// 快捷键/短命令 -> 构造方式
    short_commands: HashMap<String, ConstructionMethod>,
    /// 用户别名 -> 完整命令
    aliases: HashMap<String, String>,
    /// 构造方式 -> 完整命令（反向查找）
    method_to_command: HashMap<ConstructionMethod, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            main_commands: HashMap::new(),
            short_commands: HashMap::new(),
            aliases: HashMap::new(),
            method_to_command: HashMap::new(),
        };
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        use ConstructionMethod::*;

        self.register(SegmentTwoPoints, "LINE", &["L"]);
        self.register(CircleCenterRadius, "CIRCLE", &["C"]);
        self.register(CircleThreePoints, "CIRCLE3P", &["C3", "3P"]);
        self.register(ArcThreePoints, "ARC", &["A"]);
        self.register(ArcRadiusChord, "ARCCHORD", &["AC"]);
        self.register(SplineBezier, "BEZIER", &["BZ", "SPLINE", "SPL"]);
        self.register(SplineRoundedPolyline, "ROUNDPOLY", &["RPL", "FILLETPOLY"]);
        self.register(PolygonFree, "POLYGON", &["PG"]);
        self.register(PolygonCircumscribed, "POLYCIRC", &["POL", "PC"]);
        self.register(PolygonInscribed, "POLYINSC", &["PI"]);
        self.register(RectangleBySides, "RECTANGLE", &["REC", "R"]);
        self.register(RectangleFromCenter, "RECCENTER", &["RC"]);
    }

    /// 注册命令（不区分大小写）
    pub fn register(&mut self, method: ConstructionMethod, full_cmd: &str, shortcuts: &[&str]) {
        let full = full_cmd.to_uppercase();
        self.main_commands.insert(full.clone(), method);
        self.method_to_command.insert(method, full);
        for shortcut in shortcuts {
            self.short_commands.insert(shortcut.to_uppercase(), method);
        }
    }

    /// 添加别名，目标必须是已注册的完整命令
    pub fn add_alias(&mut self, alias: &str, command: &str) -> bool {
        let command = command.to_uppercase();
        if !self.main_commands.contains_key(&command) {
            return false;
        }
        self.aliases.insert(alias.to_uppercase(), command);
        true
    }

    /// 查找命令：完整命令 → 快捷键 → 别名
    pub fn lookup(&self, input: &str) -> Option<ConstructionMethod> {
        let key = input.trim().to_uppercase();
        self.main_commands
            .get(&key)
            .or_else(|| self.short_commands.get(&key))
            .or_else(|| {
                self.aliases
                    .get(&key)
                    .and_then(|cmd| self.main_commands.get(cmd))
            })
            .copied()
    }

    pub fn command_for(&self, method: ConstructionMethod) -> Option<&str> {
        self.method_to_command.get(&method).map(String::as_str)
    }

    /// Tab 补全：所有以 prefix 开头的完整命令，按字母排序
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.trim().to_uppercase();
        let mut results: Vec<String> = self
            .main_commands
            .keys()
            .filter(|cmd| cmd.starts_with(&prefix))
            .cloned()
            .collect();
        results.sort();
        results
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

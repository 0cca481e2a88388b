//! 场景测试
